//! Minimal batch-mode demo front end for the NeuroShell core. This is a
//! collaborator stub exercising the engine end to end, not part of the
//! core library itself - real builtins, stdlib scripts, and the REPL
//! live outside this crate's scope (spec §1).

use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use indexmap::IndexMap;
use neuroshell_core::{Command, Config, Engine, EngineFacade, FsScriptLoader, InMemoryStdlib, ParseMode};

#[derive(Parser)]
#[command(name = "neuroshell")]
#[command(about = "NeuroShell core execution engine demo driver")]
#[command(version)]
struct Cli {
    /// Execute the script from a command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Echo each dispatched command before running it
    #[arg(long = "echo")]
    echo: bool,

    /// Output the final variable store as JSON
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

/// `\echo <message>` - prints its message verbatim. Read-only: it never
/// resets `_status`/`_error`.
struct Echo;

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, facade: &mut EngineFacade, _options: &IndexMap<String, String>, message: &str) -> Result<(), String> {
        if !facade.is_silent() {
            println!("{message}");
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "print a message"
    }
}

/// `\set[k=v,...]` - writes each option into the Variable Store.
struct Set;

impl Command for Set {
    fn name(&self) -> &str {
        "set"
    }

    fn execute(&self, facade: &mut EngineFacade, options: &IndexMap<String, String>, _message: &str) -> Result<(), String> {
        for (key, value) in options {
            facade.set(key, value.clone()).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "assign one or more variables"
    }
}

/// `\get[name]` - prints the named variable's current value. Read-only.
struct Get;

impl Command for Get {
    fn name(&self) -> &str {
        "get"
    }

    fn parse_mode(&self) -> ParseMode {
        ParseMode::Raw
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, facade: &mut EngineFacade, _options: &IndexMap<String, String>, message: &str) -> Result<(), String> {
        let value = facade.get(message.trim());
        if !facade.is_silent() {
            println!("{value}");
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "print a variable's value"
    }
}

fn main() {
    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: cannot read script file: {file}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: no script provided. Use -c '...', a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut config = Config::default();
    config.echo_commands = cli.echo;

    let mut engine = Engine::new(
        vec![Arc::new(Echo) as Arc<dyn Command>, Arc::new(Set), Arc::new(Get)],
        Box::new(InMemoryStdlib::new()),
        Box::new(FsScriptLoader),
        config,
    );
    engine.set_diagnostics(Box::new(|msg: &str| eprintln!("neuroshell: {msg}")));

    let mut exit_code = 0;
    for line in script.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(err) = engine.execute(line) {
            eprintln!("neuroshell: {err}");
            exit_code = 1;
            break;
        }
    }

    if cli.json {
        let vars: serde_json::Map<String, serde_json::Value> = engine
            .variables()
            .all_user()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        println!("{}", serde_json::Value::Object(vars));
    }

    std::process::exit(exit_code);
}
