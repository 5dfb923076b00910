use core::fmt::Debug;

use log::debug;
use spin::Once;

/// A kernel service that is initialized at most once.
///
/// Initialization failure is not recoverable at this level; a module that
/// cannot come up panics with its error.
#[derive(Debug)]
pub struct KernelModule<E>
where
    E: Debug,
{
    name: &'static str,
    init: fn() -> Result<(), E>,
    state: Once<()>,
}

impl<E> KernelModule<E>
where
    E: Debug,
{
    /// Creates a module around its init function.
    pub const fn new(name: &'static str, init: fn() -> Result<(), E>) -> Self {
        Self {
            name,
            init,
            state: Once::new(),
        }
    }

    /// The module name used in log output.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the init function unless it already ran. Returns true if this
    /// call was the one that performed the initialization.
    #[track_caller]
    pub fn init(&self) -> bool {
        let mut ran = false;
        self.state.call_once(|| {
            (self.init)().unwrap_or_else(|e| panic!("{} failed to initialize: {:?}", self.name, e));
            debug!("{} up", self.name);
            ran = true;
        });
        ran
    }

    /// True once the init function has completed.
    pub fn is_initialized(&self) -> bool {
        self.state.is_completed()
    }
}

/// Declares the `MODULE` static for a kernel service module.
#[macro_export]
macro_rules! declare_module {
    ($name: literal, $func: ident, $error_type: ty) => {
        #[doc = concat!("Handle for bringing up the ", $name, " service exactly once.")]
        pub static MODULE: $crate::KernelModule<$error_type> =
            $crate::KernelModule::new($name, $func);
    };

    ($name: literal, $func: ident) => {
        $crate::declare_module!($name, $func, core::convert::Infallible);
    };
}
