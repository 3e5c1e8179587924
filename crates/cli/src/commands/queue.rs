//! One-shot commands against a running engine

use onair_config::Config;
use onair_core::{RequestId, Result};
use onair_protocol::{CommandClass, ControlSocketClient, ReadinessProbe};
use onair_queue::{random_track, ClearStrategy, QueueController};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn controller(config: &Config) -> QueueController {
    let client = Arc::new(ControlSocketClient::from_config(config));
    QueueController::from_config(client, config)
}

pub async fn probe(config: &Config) -> Result<()> {
    let probe = ReadinessProbe::from_config(config);
    let elapsed = probe.run().await.into_result(probe.socket_path())?;
    println!(
        "ready ({}, {} ms)",
        probe.socket_path().display(),
        elapsed.as_millis()
    );
    Ok(())
}

pub async fn push(
    config: &Config,
    path: Option<PathBuf>,
    random: Option<PathBuf>,
    ignore_kill_switch: bool,
) -> Result<()> {
    let mut queue = controller(config);
    if ignore_kill_switch {
        tracing::warn!("pushing with the kill switch ignored");
        queue = queue.without_kill_switch();
    }
    // clap guarantees one of the two
    let track = match (path, random) {
        (Some(path), _) => path,
        (None, Some(dir)) => random_track(&dir)?,
        (None, None) => {
            return Err(onair_core::Error::validation(
                "push",
                "",
                "a track path or --random DIR is required",
            ))
        }
    };

    let receipt = queue.push(&track).await?;
    match receipt.id {
        Some(id) => println!("{id}"),
        None => println!("{}", receipt.reply),
    }
    Ok(())
}

pub async fn skip(config: &Config) -> Result<()> {
    let reply = controller(config).skip().await?;
    if !reply.trim().is_empty() {
        println!("{}", reply.trim());
    }
    Ok(())
}

pub async fn clear(config: &Config, ephemeral: bool) -> Result<()> {
    let strategy = if ephemeral {
        ClearStrategy::Ephemeral
    } else {
        ClearStrategy::Persistent
    };
    let report = controller(config).clear_queue(strategy).await?;
    println!("cleared {}", report.cleared);
    Ok(())
}

pub async fn list(config: &Config, json: bool) -> Result<()> {
    let entries = controller(config).list_queue().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in entries {
        let path = entry
            .path
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        println!("{}\t{path}", entry.id);
    }
    Ok(())
}

pub async fn metadata(config: &Config, rid: &str, json: bool) -> Result<()> {
    let id: RequestId = rid.parse()?;
    let metadata = controller(config).metadata(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }
    for (key, value) in metadata.iter() {
        println!("{key}={value}");
    }
    Ok(())
}

pub async fn send(config: &Config, verb: &str, args: Vec<String>) -> Result<()> {
    // A raw push still goes through the kill switch and track validation.
    if verb == config.protocol.push_verb {
        let receipt = controller(config).push(Path::new(&args.join(" "))).await?;
        println!("{}", receipt.reply);
        return Ok(());
    }

    let client = ControlSocketClient::from_config(config);
    let class = if verb == config.protocol.metadata_verb {
        CommandClass::Metadata
    } else {
        CommandClass::Mutation
    };
    let command = client.command(verb, args, class)?;
    let payload = client.execute(&command).await?;
    println!("{payload}");
    Ok(())
}
