use std::io::{stdin, BufRead};
use std::process::exit;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread::spawn;
use stranger_chess::Move;
use stranger_server::{Event, MemoryStore, MoveSpec, PlayerId, Registry, ServerConfig};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PLAYERS: [(&str, &str); 2] = [("alice", "Alice"), ("bob", "Bob")];

fn print_events(player: PlayerId, events: std::sync::mpsc::Receiver<Event>) {
  for event in events {
    match serde_json::to_string(&event) {
      Ok(json) => println!("{player} <- {json}"),
      Err(error) => error!(%error, "failed to encode event"),
    }
  }
}

fn main() {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stranger_server=info")),
    )
    .init();

  let config = match ServerConfig::from_env() {
    Ok(config) => config,
    Err(error) => {
      error!(%error, "invalid configuration");
      exit(1);
    }
  };

  let store = Arc::new(MemoryStore::new());
  for (player, name) in PLAYERS {
    store.register(player, name, None);
  }
  let registry = Registry::in_memory(&store, config);
  let id = registry.create_match();

  let mut printers = Vec::new();
  let mut connections = Vec::new();
  for (player, _) in PLAYERS {
    let player = PlayerId::from(player);
    let (tx, rx) = channel();
    match registry.attach_connection(id, tx, player.clone()) {
      Ok(connection) => connections.push((player.clone(), connection)),
      Err(error) => {
        error!(%error, "failed to attach");
        exit(1);
      }
    }
    if let Err(error) = registry.join_match(id, player.clone()) {
      error!(%error, "failed to join");
      exit(1);
    }
    printers.push(spawn(move || print_events(player, rx)));
  }

  println!("Enter moves like e2e4, or draw, accept, resign, quit");
  for line in stdin().lock().lines().map_while(Result::ok) {
    let Some(player) = registry.player_to_move(id) else {
      break;
    };
    let command = line.trim();
    let result = match command {
      "" => continue,
      "draw" => registry.offer_draw(id, &player).map(|_| ()),
      "accept" => registry.accept_draw(id, &player).map(|_| ()),
      "resign" => registry.resign(id, &player).map(|_| ()),
      "quit" => {
        for (owner, connection) in &connections {
          if owner == &player {
            registry.detach_connection(id, *connection).ok();
          }
        }
        break;
      }
      text => match text.parse::<Move>() {
        Ok(r#move) => registry
          .submit_move(id, &player, MoveSpec::from(r#move))
          .map(|_| ()),
        Err(error) => {
          println!("{error}");
          continue;
        }
      },
    };
    if let Err(error) = result {
      println!("{player}: {error}");
    }
    if registry.status(id).is_none() {
      break;
    }
  }

  registry.shutdown();
  drop(registry);
  for printer in printers {
    printer.join().ok();
  }
}
