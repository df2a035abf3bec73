//! Demo host: runs one command line through a small command tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use cmdgraph::{
    BindingRegistry, CmdgraphConfig, CommandCallable, CommandError, CommandGraph, CommandSpec,
    Description, Namespace, ParameterSpec, ParametricBuilder, PrimitivesModule, SimpleDispatcher,
    Subject, SubjectAuthorizer, TEXT, render_invalid_usage,
};

const USAGE: &str = "cmdgraph - run a command line through the demo command tree\n\n\
Usage: cmdgraph [OPTIONS] [--] <command line...>\n\n\
Options:\n  \
  --config <path>   Read settings from this file instead of .cmdgraph/config.toml\n  \
  --admin           Run as an operator holding every admin permission\n  \
  --complete        Print completions for the command line instead of running it\n  \
  --json            Print the command tree as JSON\n  \
  -h, --help        Show this help\n\n\
Commands:\n  \
  echo <text>                          Print the text back\n  \
  add <a> <b>                          Add two integers (0x.. and 0b.. accepted)\n  \
  admin ban <player> [-t <minutes>] [reason]\n  \
  admin kick <player> [reason]\n\n\
Append -? to any command for its help.";

#[derive(Debug, Default)]
struct HostArgs {
    config: Option<PathBuf>,
    admin: bool,
    complete: bool,
    json: bool,
    help: bool,
    line: Vec<String>,
}

fn parse_host_args(args: impl IntoIterator<Item = String>) -> Result<HostArgs> {
    let mut parsed = HostArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config requires a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--admin" => parsed.admin = true,
            "--complete" => parsed.complete = true,
            "--json" => parsed.json = true,
            "-h" | "--help" => parsed.help = true,
            "--" => {
                parsed.line.extend(args.by_ref());
                break;
            }
            other if other.starts_with("--") => bail!("Unknown option: {other}"),
            _ => {
                parsed.line.push(arg);
                parsed.line.extend(args.by_ref());
                break;
            }
        }
    }
    Ok(parsed)
}

struct Operator {
    admin: bool,
}

impl Subject for Operator {
    fn has_permission(&self, permission: &str) -> bool {
        self.admin && permission.starts_with("admin.")
    }
}

fn build_tree(config: &CmdgraphConfig) -> Result<Arc<SimpleDispatcher>> {
    let mut registry = BindingRegistry::new();
    registry.install(&PrimitivesModule);

    let mut builder = ParametricBuilder::new(Arc::new(registry)).with_config(config);
    builder.set_authorizer(SubjectAuthorizer);

    let mut graph = CommandGraph::with_config(builder, config);
    graph.describe("Demo command tree");

    graph.register(
        CommandSpec::new(["echo", "say"])
            .param(ParameterSpec::of::<String>().classified(TEXT))
            .desc("Print the text back"),
        |mut args, _ns| {
            println!("{}", args.require::<String>(0)?);
            Ok(())
        },
    )?;

    graph.register(
        CommandSpec::new(["add"])
            .param(ParameterSpec::of::<i64>().named("a"))
            .param(ParameterSpec::of::<i64>().named("b"))
            .desc("Add two integers"),
        |mut args, _ns| {
            let a: i64 = args.require(0)?;
            let b: i64 = args.require(1)?;
            let sum = a
                .checked_add(b)
                .ok_or_else(|| CommandError::command("The sum does not fit in 64 bits"))?;
            println!("{sum}");
            Ok(())
        },
    )?;

    graph.group(["admin"])?.describe("Moderation commands");
    graph.register(
        CommandSpec::new(["ban"])
            .param(ParameterSpec::of::<String>().named("player"))
            .param(ParameterSpec::of::<u32>().named("minutes").switch('t'))
            .param(ParameterSpec::of::<String>().classified(TEXT).named("reason").optional(Vec::<String>::new()))
            .desc("Ban a player")
            .require("admin.ban"),
        |mut args, _ns| {
            let player: String = args.require(0)?;
            let minutes = args.take::<u32>(1);
            let reason = args.take::<String>(2);
            let duration = match minutes {
                Some(m) => format!("for {m} minutes"),
                None => "permanently".to_string(),
            };
            match reason {
                Some(reason) => println!("Banned {player} {duration}: {reason}"),
                None => println!("Banned {player} {duration}"),
            }
            Ok(())
        },
    )?;
    graph.register(
        CommandSpec::new(["kick"])
            .param(ParameterSpec::of::<String>().named("player"))
            .param(ParameterSpec::of::<String>().classified(TEXT).named("reason").optional(Vec::<String>::new()))
            .desc("Kick a player")
            .require("admin.kick"),
        |mut args, _ns| {
            let player: String = args.require(0)?;
            match args.take::<String>(1) {
                Some(reason) => println!("Kicked {player}: {reason}"),
                None => println!("Kicked {player}"),
            }
            Ok(())
        },
    )?;
    graph.parent()?;

    Ok(graph.build()?)
}

#[derive(Serialize)]
struct TreeNode<'a> {
    aliases: &'a [String],
    usage: String,
    description: &'a Description,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode<'a>>,
}

fn tree_nodes(dispatcher: &SimpleDispatcher) -> Vec<TreeNode<'_>> {
    dispatcher
        .commands()
        .into_iter()
        .map(|mapping| TreeNode {
            aliases: mapping.all_aliases(),
            usage: mapping.description().usage(),
            description: mapping.description(),
            children: mapping
                .callable()
                .as_dispatcher()
                .map(tree_nodes)
                .unwrap_or_default(),
        })
        .collect()
}

fn run(args: HostArgs) -> Result<i32> {
    if args.help {
        println!("{USAGE}");
        return Ok(0);
    }

    let config = match &args.config {
        Some(path) => CmdgraphConfig::load_from_path(path),
        None => CmdgraphConfig::load(&std::env::current_dir()?),
    };
    let root = build_tree(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tree_nodes(&root))?);
        return Ok(0);
    }

    let mut namespace = Namespace::new();
    namespace.put::<Arc<dyn Subject>>(Arc::new(Operator { admin: args.admin }));
    let line = args.line.join(" ");
    debug!(%line, admin = args.admin, "running");

    if args.complete {
        for suggestion in root.suggestions(&line, &namespace)? {
            println!("{suggestion}");
        }
        return Ok(0);
    }

    match root.call(&line, &mut namespace, &[]) {
        Ok(_) => Ok(0),
        Err(CommandError::InvalidUsage(usage)) => {
            eprintln!("{}", render_invalid_usage(&usage, ""));
            Ok(1)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(1)
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let code = match parse_host_args(std::env::args().skip(1)).and_then(run) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };
    std::process::exit(code);
}
