/*++

Licensed under the Apache-2.0 license.

File Name:

    wait.rs

Abstract:

    File contains common functions to implement bounded wait routines.

--*/

use sboot_error::{SbootError, SbootResult};

/// Poll `predicate` until it returns true
///
/// # Arguments
///
/// * `polls` - Maximum number of polls; at least one poll is always made
/// * `err` - Error returned when the budget is exhausted
/// * `predicate` - Condition to wait for
pub fn until<F>(polls: u32, err: SbootError, mut predicate: F) -> SbootResult<()>
where
    F: FnMut() -> bool,
{
    for _ in 0..polls.max(1) {
        if predicate() {
            return Ok(());
        }
    }
    Err(err)
}
