//! Limine boot protocol requests.

use core::convert::Infallible;

use crust::declare_module;
use crust::limine::request::ExecutableFileRequest;
use crust::limine::response::ExecutableFileResponse;
use spin::Once;

#[used]
static EXECUTABLE_FILE_REQUEST: ExecutableFileRequest = ExecutableFileRequest::new();
static EXECUTABLE_FILE: Once<&'static ExecutableFileResponse> = Once::new();

/// The kernel command line as handed over by the bootloader. Empty if the
/// bootloader gave us nothing usable.
pub fn cmdline() -> &'static str {
    EXECUTABLE_FILE
        .get()
        .map(|response| response.file().cmdline())
        .and_then(|cmdline| core::str::from_utf8(cmdline).ok())
        .unwrap_or("")
}

fn init() -> Result<(), Infallible> {
    let response = EXECUTABLE_FILE_REQUEST
        .get_response()
        .expect("bootloader left no executable file response");
    EXECUTABLE_FILE.call_once(|| response);
    Ok(())
}

declare_module!("requests", init);
