use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let code = curator::run()?;
    Ok(code)
}
