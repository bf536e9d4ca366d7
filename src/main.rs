mod commands;
mod render;
mod settings;

use minesweeper_engine::{Engine, EngineConfig, emitter};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, trace, warn};

use crate::{
    commands::{Command, Flow},
    render::Notice,
};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Forwards engine events to the front end loop.
fn subscribe(engine: &mut Engine) -> mpsc::UnboundedReceiver<Notice> {
    let (sender, receiver) = mpsc::unbounded_channel();

    let forward = |notice: Notice| {
        let sender = sender.clone();
        move |()| {
            let _ = sender.send(notice);
        }
    };

    engine.on_init.register(forward(Notice::Menu));
    engine.on_start.register(forward(Notice::Redraw));
    engine.on_change.register(forward(Notice::Redraw));
    engine.view_mut().on_change.register(forward(Notice::Redraw));
    engine.on_win.register(forward(Notice::Won));
    engine.on_lose.register(forward(Notice::Lost));
    engine.on_flag.register(forward(Notice::NoFlags));

    engine
        .stopwatch()
        .set_on_tick(|time| trace!("Elapsed {}", render::format_elapsed(time)));

    receiver
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = EngineConfig::from_env();
    let params = settings::board_params_from_env();
    info!(
        "Engine config: tick {:?}, view size {}, seed {:?}",
        config.tick, config.view_size, config.seed
    );

    let (scheduler, mut events) = emitter::channel();
    let mut engine = Engine::new(&config, &scheduler);
    let mut notices = subscribe(&mut engine);

    if let Err(e) = engine.set_params(params) {
        warn!("Ignoring board settings from the environment: {}", e);
    }
    engine.init();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        events.run_pending();

        let mut redraw = false;
        while let Ok(notice) = notices.try_recv() {
            match notice {
                Notice::Menu => println!("{}", commands::HELP),
                Notice::Redraw => redraw = true,
                _ => {}
            }
            if let Some(alert) = notice.alert() {
                println!("*** {} ***", alert);
            }
        }
        if redraw {
            print!("{}", render::board(&engine));
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.parse::<Command>() {
            Ok(command) => {
                let (flow, reply) = commands::apply(&mut engine, command);
                if let Some(reply) = reply {
                    println!("{}", reply);
                }
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    info!("Bye after {} ticks", engine.time());
    Ok(())
}
