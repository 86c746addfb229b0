// Licensed under the Apache-2.0 license

mod helpers;

mod test_bitstream;
mod test_boot_header;
mod test_chain_of_trust;
mod test_pmu;
mod test_ps_load;
mod test_tcm;
