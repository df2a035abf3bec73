//! Library-level flow tests: tokenize, route, bind, invoke.

use std::sync::{Arc, Mutex};

use cmdgraph::{
    BindingRegistry, CommandCallable, CommandError, CommandGraph, CommandSpec, Description,
    EnumProvider, Namespace, ParameterSpec, ParametricBuilder, PrimitivesModule, RegistrationError,
    SimpleDispatcher, Tag, TEXT,
};

/// Host-implemented leaf that records what reached it.
struct Recorder {
    description: Description,
    seen: Mutex<Vec<(String, Vec<String>)>>,
}

impl Recorder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            description: Description::default(),
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl CommandCallable for Recorder {
    fn call(
        self: Arc<Self>,
        arguments: &str,
        _namespace: &mut Namespace,
        parent_commands: &[String],
    ) -> Result<bool, CommandError> {
        self.seen
            .lock()
            .expect("lock")
            .push((arguments.to_string(), parent_commands.to_vec()));
        Ok(true)
    }

    fn description(&self) -> &Description {
        &self.description
    }

    fn test_permission(&self, _namespace: &Namespace) -> bool {
        true
    }

    fn suggestions(&self, _arguments: &str, _namespace: &Namespace) -> Result<Vec<String>, CommandError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weather {
    Clear,
    Rain,
    Thunder,
}

fn registry() -> Arc<BindingRegistry> {
    let mut registry = BindingRegistry::new();
    registry.install(&PrimitivesModule);
    registry.bind::<Weather>().to_provider(EnumProvider::new(
        "Weather",
        [
            ("clear", Weather::Clear),
            ("rain", Weather::Rain),
            ("thunder", Weather::Thunder),
        ],
    ));
    Arc::new(registry)
}

mod routing {
    use super::*;

    #[test]
    fn group_leaf_receives_remainder_and_full_path() {
        let leaf = Recorder::new();
        let mut group = SimpleDispatcher::new();
        group.register_command(leaf.clone(), ["sub"]).expect("sub");
        let mut root = SimpleDispatcher::new();
        root.register_command(Arc::new(group), ["group"])
            .expect("group");
        let root = Arc::new(root);

        let mut ns = Namespace::new();
        assert!(root.call("group sub x y", &mut ns, &[]).expect("call"));
        assert_eq!(
            *leaf.seen.lock().expect("lock"),
            vec![(
                "x y".to_string(),
                vec!["group".to_string(), "sub".to_string()]
            )]
        );
    }

    #[test]
    fn case_insensitive_alias_collision() {
        let mut dispatcher = SimpleDispatcher::new();
        dispatcher
            .register_command(Recorder::new(), ["Foo"])
            .expect("Foo");
        let err = dispatcher
            .register_command(Recorder::new(), ["foo"])
            .unwrap_err();
        assert!(matches!(err, RegistrationError::AliasTaken(_)));
    }

    #[test]
    fn insufficient_depth_is_full_help_usage() {
        let mut graph = CommandGraph::new(ParametricBuilder::new(registry()));
        graph.group(["world"]).expect("world");
        graph
            .register(CommandSpec::new(["spawn"]), |_, _| Ok(()))
            .expect("spawn");
        let root = graph.build().expect("build");

        let mut ns = Namespace::new();
        let err = root.call("world", &mut ns, &[]).unwrap_err();
        let usage = err.as_invalid_usage().expect("invalid usage");
        assert_eq!(usage.message.as_deref(), Some("Please choose a sub-command."));
        assert!(usage.full_help_suggested);
        assert_eq!(usage.alias_stack, vec!["world"]);
        assert!(usage.command.as_dispatcher().is_some());
    }
}

mod binding {
    use super::*;

    #[test]
    fn weather_command_binds_enum_and_optional_duration() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut graph = CommandGraph::new(ParametricBuilder::new(registry()));
        graph
            .register(
                CommandSpec::new(["weather"])
                    .param(ParameterSpec::of::<Weather>())
                    .param(
                        ParameterSpec::of::<u32>()
                            .named("seconds")
                            .optional(["300"])
                            .tag(Tag::Range {
                                min: Some(1.0),
                                max: Some(3600.0),
                            }),
                    ),
                move |mut args, _ns| {
                    let weather: Weather = args.require(0)?;
                    let seconds: u32 = args.require(1)?;
                    sink.lock().expect("lock").push((weather, seconds));
                    Ok(())
                },
            )
            .expect("weather");
        let root = graph.build().expect("build");
        let mut ns = Namespace::new();

        assert!(Arc::clone(&root).call("weather RAIN", &mut ns, &[]).expect("rain"));
        assert!(Arc::clone(&root).call("Weather thunder 0x3c", &mut ns, &[]).expect("thunder"));
        assert_eq!(
            *calls.lock().expect("lock"),
            vec![(Weather::Rain, 300), (Weather::Thunder, 60)]
        );

        let err = Arc::clone(&root).call("weather snow", &mut ns, &[]).unwrap_err();
        assert_eq!(
            err.as_invalid_usage().and_then(|u| u.message.as_deref()),
            Some("For parameter 'weather': No matching value found in the 'Weather' list.")
        );

        let err = Arc::clone(&root).call("weather clear 9000", &mut ns, &[]).unwrap_err();
        assert_eq!(
            err.as_invalid_usage().and_then(|u| u.message.as_deref()),
            Some("For parameter 'seconds': A valid value is less than or equal to 3600 (you entered 9000)")
        );
    }

    #[test]
    fn flags_and_text_remainder() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let mut graph = CommandGraph::new(ParametricBuilder::new(registry()));
        graph
            .register(
                CommandSpec::new(["broadcast"])
                    .param(ParameterSpec::of::<String>().classified(TEXT).named("message"))
                    .param(ParameterSpec::of::<bool>().switch('s'))
                    .param(ParameterSpec::of::<String>().named("channel").switch('c')),
                move |mut args, _ns| {
                    let message: String = args.require(0)?;
                    let silent: bool = args.require(1)?;
                    let channel = args.take::<String>(2);
                    *sink.lock().expect("lock") = Some((message, silent, channel));
                    Ok(())
                },
            )
            .expect("broadcast");
        let root = graph.build().expect("build");
        let mut ns = Namespace::new();

        root.clone()
            .call("broadcast -s -c ops 'server restart'  in 5", &mut ns, &[])
            .expect("call");
        assert_eq!(
            *seen.lock().expect("lock"),
            Some((
                "'server restart'  in 5".to_string(),
                true,
                Some("ops".to_string())
            ))
        );

        for (line, expected) in [
            ("broadcast hello world -s", ("hello world", true, None)),
            ("broadcast hello -c ops", ("hello", false, Some("ops"))),
            ("broadcast hello ", ("hello", false, None)),
        ] {
            root.clone().call(line, &mut ns, &[]).expect("call");
            let (message, silent, channel) = expected;
            assert_eq!(
                *seen.lock().expect("lock"),
                Some((message.to_string(), silent, channel.map(str::to_string))),
                "line {line:?}"
            );
        }

        let err = root.call("broadcast -x hi", &mut ns, &[]).unwrap_err();
        assert_eq!(
            err.as_invalid_usage().and_then(|u| u.message.as_deref()),
            Some("Too many arguments! Unused arguments: -x")
        );
    }
}

mod errors {
    use super::*;

    #[test]
    fn command_and_authorization_errors_pass_through_levels() {
        let mut builder = ParametricBuilder::new(registry());
        builder.set_authorizer(|_: &Namespace, permission: &str| permission != "deny.me");
        let mut graph = CommandGraph::new(builder);
        graph.group(["outer"]).expect("outer");
        graph.group(["inner"]).expect("inner");
        graph
            .register(CommandSpec::new(["fail"]), |_, _| {
                Err(CommandError::command("Nothing to undo").into())
            })
            .expect("fail");
        graph
            .register(CommandSpec::new(["locked"]).require("deny.me"), |_, _| Ok(()))
            .expect("locked");
        let root = graph.build().expect("build");
        let mut ns = Namespace::new();

        let err = Arc::clone(&root)
            .call("outer inner fail", &mut ns, &[])
            .unwrap_err();
        assert!(matches!(&err, CommandError::Command(m) if m == "Nothing to undo"));

        let err = root.call("outer inner locked", &mut ns, &[]).unwrap_err();
        assert!(matches!(err, CommandError::Authorization));
    }

    #[test]
    fn handler_failures_wrap_once_as_invocation() {
        let mut graph = CommandGraph::new(ParametricBuilder::new(registry()));
        graph.group(["db"]).expect("db");
        graph
            .register(CommandSpec::new(["migrate"]), |_, _| {
                Err(anyhow::anyhow!("connection refused"))
            })
            .expect("migrate");
        let root = graph.build().expect("build");

        let mut ns = Namespace::new();
        match root.call("db migrate", &mut ns, &[]) {
            Err(CommandError::Invocation(err)) => {
                assert_eq!(err.to_string(), "connection refused");
                assert!(err.message.is_none());
            }
            other => panic!("expected invocation error, got {other:?}"),
        }
    }
}

mod completion {
    use super::*;

    fn tree() -> Arc<SimpleDispatcher> {
        let mut graph = CommandGraph::new(ParametricBuilder::new(registry()));
        graph
            .register(
                CommandSpec::new(["weather", "w"]).param(ParameterSpec::of::<Weather>()),
                |_, _| Ok(()),
            )
            .expect("weather");
        graph
            .register(
                CommandSpec::new(["toggle"]).param(ParameterSpec::of::<bool>()),
                |_, _| Ok(()),
            )
            .expect("toggle");
        graph.build().expect("build")
    }

    #[test]
    fn suggestions_descend_into_leaf_providers() {
        let root = tree();
        let ns = Namespace::new();
        assert_eq!(root.suggestions("", &ns).expect("root"), vec!["toggle", "weather"]);
        assert_eq!(root.suggestions("W", &ns).expect("w"), vec!["weather"]);
        assert_eq!(
            root.suggestions("w ", &ns).expect("values"),
            vec!["clear", "rain", "thunder"]
        );
        assert_eq!(root.suggestions("weather th", &ns).expect("prefix"), vec!["thunder"]);
        assert_eq!(root.suggestions("toggle ", &ns).expect("bool"), vec!["true", "false"]);
    }

    #[test]
    fn suggestions_are_idempotent() {
        let root = tree();
        let ns = Namespace::new();
        for input in ["", "we", "weather ", "weather r", "nothing here"] {
            let first = root.suggestions(input, &ns).expect("first");
            let second = root.suggestions(input, &ns).expect("second");
            assert_eq!(first, second, "input {input:?}");
        }
    }

    #[test]
    fn shared_tree_serves_concurrent_calls() {
        let root = tree();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let root = Arc::clone(&root);
                scope.spawn(move || {
                    let mut ns = Namespace::new();
                    for _ in 0..25 {
                        assert!(Arc::clone(&root).call("weather clear", &mut ns, &[]).expect("call"));
                        assert_eq!(root.suggestions("weather c", &ns).expect("suggest"), vec!["clear"]);
                    }
                });
            }
        });
    }
}
