use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use dispatchkit::core::{Actor, ActorId, ActorKind, ConsoleActor, LockScope, TargetKind};
use dispatchkit::{
    CommandExecutor, CommandRegistration, CommandRegistry, Config, Param, Route, RoutingConfig,
    TaskScheduler, TokioScheduler, UsageHelp,
};

/// The person at the terminal
struct TerminalActor {
    id: ActorId,
    name: String,
}

impl Actor for TerminalActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActorKind {
        ActorKind::Interactive
    }

    fn has_permission(&self, permission: &str) -> bool {
        !permission.starts_with("demo.admin")
    }

    fn is_operator(&self) -> bool {
        false
    }

    fn send_message(&self, message: &str) {
        println!("{message}");
    }
}

fn demo_executor(config: &Config, scheduler: Arc<dyn TaskScheduler>) -> Result<CommandExecutor> {
    CommandExecutor::builder()
        .config(config)
        .scheduler(scheduler)
        .hooks(UsageHelp::with_header("Available commands:"))
        .provider("players", |ctx| vec![ctx.actor.name().to_string(), "console".to_string()])
        .route(
            Route::new("echo <words...>")
                .param(Param::arg::<Vec<String>>("words").hint("<text>"))
                .handler(|inv| {
                    let words = inv.args.get::<Vec<String>>("words").cloned().unwrap_or_default();
                    inv.actor.send_message(&words.join(" "));
                    Ok(())
                }),
        )
        .route(
            Route::new("add <a> <b>")
                .param(Param::arg::<i64>("a"))
                .param(Param::arg::<i64>("b"))
                .handler(|inv| {
                    let (Some(a), Some(b)) = (inv.args.get::<i64>("a"), inv.args.get::<i64>("b"))
                    else {
                        anyhow::bail!("add needs two numbers");
                    };
                    inv.actor.send_message(&format!("{a} + {b} = {}", a + b));
                    Ok(())
                }),
        )
        .route(
            Route::new("greet <player>")
                .param(Param::sender())
                .param(Param::arg::<String>("player").suggest("players"))
                .handler(|inv| {
                    let from = inv.args.sender().map(|a| a.name().to_string()).unwrap_or_default();
                    let to = inv.args.get::<String>("player").cloned().unwrap_or_default();
                    inv.actor.send_message(&format!("{from} waves at {to}"));
                    Ok(())
                }),
        )
        .route(
            Route::new("slow <seconds>")
                .param(Param::arg::<u64>("seconds"))
                .run_async()
                .single_flight(LockScope::Sender)
                .handler(|inv| {
                    let seconds = inv.args.get::<u64>("seconds").copied().unwrap_or(1);
                    std::thread::sleep(Duration::from_secs(seconds));
                    inv.actor.send_message(&format!("Finished after {seconds}s"));
                    Ok(())
                }),
        )
        .route(Route::new("heal").cooldown(5).handler(|inv| {
            inv.actor.send_message("You feel better.");
            Ok(())
        }))
        .route(
            Route::new("ban <player>")
                .param(Param::arg::<String>("player"))
                .require_op(true)
                .handler(|inv| {
                    let player = inv.args.get::<String>("player").cloned().unwrap_or_default();
                    inv.actor.send_message(&format!("Banned {player}"));
                    Ok(())
                }),
        )
        .route(
            Route::new("reset")
                .permission("demo.admin.reset")
                .handler(|inv| {
                    inv.actor.send_message("State reset.");
                    Ok(())
                }),
        )
        .route(
            Route::new("shutdown")
                .target(TargetKind::Console)
                .handler(|inv| {
                    inv.actor.send_message("Shutdown requested.");
                    Ok(())
                }),
        )
        .build()
}

fn load_routing(path: &str) -> RoutingConfig {
    match RoutingConfig::load(path) {
        Ok(routing) => {
            info!("📄 Loaded routing from {path}");
            routing
        }
        Err(e) => {
            if Path::new(path).exists() {
                error!("❌ Failed to load routing from {path}: {e:#}");
            } else {
                info!("📄 No routing file at {path} - using built-in registration");
            }
            RoutingConfig {
                commands: vec![CommandRegistration::new("demo")
                    .alias("d")
                    .description("Demo commands")],
            }
        }
    }
}

/// Split a completion request into label and tokens, keeping a trailing empty token
fn completion_tokens(body: &str) -> Option<(String, Vec<String>)> {
    let mut parts: Vec<String> = body.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        return None;
    }
    if parts.len() == 1 || body.ends_with(char::is_whitespace) {
        parts.push(String::new());
    }
    let label = parts.remove(0);
    Some((label.trim_start_matches('/').to_string(), parts))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting dispatch console...");

    let scheduler: Arc<dyn TaskScheduler> = Arc::new(TokioScheduler::current()?);
    let executor = Arc::new(demo_executor(&config, Arc::clone(&scheduler))?);

    let routing = load_routing(&config.routing_path);
    let executors = HashMap::from([("demo".to_string(), executor)]);

    let mut registry = CommandRegistry::new();
    let mut changes = registry.subscribe();
    let registered = registry.register_from_config(&routing, &executors)?;
    if registered == 0 {
        warn!("Routing file registers no command named 'demo'; nothing to dispatch");
    }
    while let Ok(change) = changes.try_recv() {
        info!("Registry: {}", serde_json::to_string(&change)?);
    }

    let user: Arc<dyn Actor> = Arc::new(TerminalActor {
        id: ActorId::new(),
        name: std::env::var("USER").unwrap_or_else(|_| "player".to_string()),
    });
    let console: Arc<dyn Actor> = Arc::new(ConsoleActor);

    println!(
        "Commands: {}. Prefix a line with '!' to run it as the console, end it with '?' to complete.",
        registry.command_names().join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }

        let (actor, line) = match line.strip_prefix('!') {
            Some(rest) => (Arc::clone(&console), rest),
            None => (Arc::clone(&user), line),
        };

        if let Some(body) = line.strip_suffix('?') {
            let Some((label, tokens)) = completion_tokens(body) else {
                continue;
            };
            match registry.on_completion_request(actor.as_ref(), &label, &tokens) {
                Some(candidates) if !candidates.is_empty() => println!("{}", candidates.join("  ")),
                Some(_) => println!("(no suggestions)"),
                None => println!("(completion unavailable)"),
            }
            continue;
        }

        if registry.dispatch_line(actor, line).is_none() {
            println!("Unknown command. Try: {}", registry.command_names().join(", "));
        }
    }

    registry.unregister_all();
    info!("Dispatch console stopped");
    Ok(())
}
