//! EuropaCSS IntelliSense - language server and command-line tool for EuropaCSS themes

use std::process::ExitCode;

use europa_lsp::cli;

fn main() -> ExitCode {
    cli::run()
}
