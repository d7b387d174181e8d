/*! Integration tests for the Sylva cache.
 *
 * Organized as a single integration test binary:
 * - properties: the behavioral guarantees of merge/resolve/observe
 * - merge: writes, versions, shape conflicts and document deletion
 * - observe: live result sets, sorting and teardown
 * - errors: malformed descriptors, reentrancy and selector failures
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("sylva_cache=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod errors;
mod merge;
mod observe;
