pub mod test_gc_header;
pub mod test_sweep;

use crate::{RivetVM, VmOption};

/// Runtime whose collections only happen when a test asks for them.
pub(crate) fn manual_gc_vm() -> RivetVM {
    let option = VmOption {
        gc_auto: false,
        ..VmOption::default()
    };
    RivetVM::new(option).unwrap()
}

/// Route tracing output through the test harness. `RUST_LOG=rivet=trace`
/// shows table resizes and collections.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
