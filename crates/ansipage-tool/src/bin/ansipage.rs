fn main() -> anyhow::Result<()> {
    let result = ansipage_tool::cli::run();

    // Flush the stream before an error report lands on the terminal
    use std::io::{self, Write};
    let _ = io::stdout().flush();

    result
}
