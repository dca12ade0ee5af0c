// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Asset pipeline command line tool
// Run with: quark-assets <command>

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use quark_agents::asset_agent::{AssetConfig, AssetManager};
use quark_core::asset::{
    resources::{Audio, ShaderPipeline, Texture},
    AssetHandle,
};
use quark_lanes::asset_lane::PackBuilder;
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "quark-assets", version, about = "Load and pack engine assets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load assets and print what was decoded
    Load {
        /// RON configuration file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Issue all requests asynchronously and wait for them together
        #[arg(long = "async")]
        concurrent: bool,
        /// Seconds to wait for asynchronous loads
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        /// Asset identifiers, `[scheme:]path.ext`
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Build `index.bin` and `data.pack` from a directory tree
    Pack {
        /// Directory to pack
        source: PathBuf,
        /// Output directory
        out: PathBuf,
    },
}

fn describe(handle: &AssetHandle) -> String {
    if let Some(texture) = handle.downcast_ref::<Texture>() {
        format!(
            "texture {:?} {}x{}, {} mip levels",
            texture.format(),
            texture.width(),
            texture.height(),
            texture.mip_levels()
        )
    } else if let Some(audio) = handle.downcast_ref::<Audio>() {
        format!(
            "audio {:?} at {} Hz, {} ms",
            audio.format(),
            audio.rate(),
            audio.duration()
        )
    } else if let Some(pipeline) = handle.downcast_ref::<ShaderPipeline>() {
        format!(
            "pipeline {:?}, {} uniforms",
            pipeline.stage_types(),
            pipeline.uniforms().count()
        )
    } else {
        format!("{:?} resource", handle.kind())
    }
}

fn load(config: Option<PathBuf>, concurrent: bool, timeout: u64, ids: &[String]) -> Result<()> {
    let config = match config {
        Some(path) => AssetConfig::load(&path)?,
        None => AssetConfig::default(),
    };
    let manager = AssetManager::with_defaults(config).context("Failed to set up asset manager")?;

    let outcomes: Vec<_> = if concurrent {
        let pending: Vec<_> = ids.iter().map(|id| manager.request(id)).collect();
        pending
            .into_iter()
            .map(|mut p| {
                p.wait_timeout(Duration::from_secs(timeout))
                    .with_context(|| format!("Timed out loading '{}'", p.key()))
            })
            .collect::<Result<_>>()?
    } else {
        ids.iter().map(|id| manager.load(id)).collect()
    };

    let mut failures = 0;
    for (id, outcome) in ids.iter().zip(outcomes) {
        match outcome {
            Ok(handle) => println!(
                "{id}: {} ({} host bytes)",
                describe(&handle),
                handle.host_memory_bytes()
            ),
            Err(e) => {
                failures += 1;
                eprintln!("{id}: {e}");
            }
        }
    }

    let unloaded = manager.unload_all_assets();
    log::info!("Unloaded {unloaded} assets.");
    if failures > 0 {
        bail!("{failures} of {} assets failed to load", ids.len());
    }
    Ok(())
}

fn pack(source: PathBuf, out: PathBuf) -> Result<()> {
    let mut builder = PackBuilder::new();
    let added = builder.add_directory(&source)?;
    if added == 0 {
        log::warn!("No asset files found under '{}'.", source.display());
    }
    let summary = builder.write(&out)?;
    println!(
        "Packed {} assets ({:.2} KB) into '{}'",
        summary.entries,
        summary.data_bytes as f64 / 1024.0,
        out.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Load {
            config,
            concurrent,
            timeout,
            ids,
        } => load(config, concurrent, timeout, &ids),
        Command::Pack { source, out } => pack(source, out),
    }
}
