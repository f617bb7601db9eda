use anyhow::Result;
use argh::FromArgs;
use calc_commands::Interpreter;
use calc_commands::console::ReplConsole;
use calc_commands::storage::FileStorage;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Crash-resilient command-line calculator. The command being executed is
/// persisted after every step; restarting the binary picks up exactly where
/// it stopped. Type help for the command list, exit to quit.
struct Args {
    /// file holding the in-flight command state
    #[argh(option, default = "String::from(\"calc.state\")")]
    state: String,

    /// prompt shown before each input line
    #[argh(option, default = "String::from(\"> \")")]
    prompt: String,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut console = ReplConsole::new(args.prompt)?;
    let mut storage = FileStorage::new(args.state);
    Interpreter::default().run(&mut console, &mut storage)
}
