// Copyright (C) 2024  Johannes Kepler University Linz, Institute of Networks and Security
// Copyright (C) 2024  CDL Digidow <https://www.digidow.eu/>
//
// Licensed under the EUPL, Version 1.2 or – as soon they will be approved by
// the European Commission - subsequent versions of the EUPL (the "Licence").
// You may not use this work except in compliance with the Licence.
//
// You should have received a copy of the European Union Public License along
// with this program.  If not, you may obtain a copy of the Licence at:
// <https://joinup.ec.europa.eu/software/page/eupl>
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the Licence is distributed on an "AS IS" basis,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the Licence for the specific language governing permissions and
// limitations under the Licence.

mod building;
mod config;
mod misc;
mod registry;

use crate::config::DatasetConfig;
use crate::misc::ImageDataInfo;
use crate::registry::Registry;
use itertools::Itertools;
use pico_args::Arguments;
use serde::Serialize;
use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

type Pid = i64;
type CamId = u64;

/// `(image path, identity, camera)`
pub type Sample = (PathBuf, Pid, CamId);

const ACTIONS: [&str; 5] = ["summary", "show", "export", "stats-csv", "list"];

/// Train/query/gallery splits of a re-identification benchmark, as handed to a training or
/// evaluation framework.
pub trait Dataset {
    fn train(&self) -> &[Sample];
    fn query(&self) -> &[Sample];
    fn gallery(&self) -> &[Sample];
    fn name(&self) -> String;

    /// Statistics of train, query and gallery, in that order.
    fn statistics(&self) -> (ImageDataInfo, ImageDataInfo, ImageDataInfo);

    fn show_summary(&self) {
        let (train, query, gallery) = self.statistics();
        println!("=> {} loaded", self.name());
        misc::print_dataset_statistics(&train, &query, &gallery);
    }
}

#[derive(Serialize)]
struct Export<'a> {
    name: String,
    train: &'a [Sample],
    query: &'a [Sample],
    gallery: &'a [Sample],
}

fn write_export<W: Write>(data: &dyn Dataset, writer: W) -> Result<(), serde_json::Error> {
    let export = Export {
        name: data.name(),
        train: data.train(),
        query: data.query(),
        gallery: data.gallery(),
    };
    serde_json::to_writer_pretty(writer, &export)
}

/// Writes all splits to `out` as JSON.
///
/// The data goes to `<out>.part` first and is renamed once complete, so a failed export leaves
/// no file behind. Sample paths must be valid UTF-8, otherwise serialization fails.
fn export(data: &dyn Dataset, out: &Path) -> Result<(), Box<dyn Error>> {
    let part = out.with_extension("json.part");
    let written = File::create(&part)
        .map_err(Box::<dyn Error>::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_export(data, &mut writer)?;
            writer.flush()?;
            Ok(())
        });

    if let Err(e) = written {
        if part.exists() {
            std::fs::remove_file(&part)?;
        }
        return Err(e);
    }

    std::fs::rename(&part, out)?;
    log::info!("Wrote {} splits to {}", data.name(), out.display());
    Ok(())
}

fn stats_csv<W: Write>(data: &dyn Dataset, writer: W) -> Result<(), csv::Error> {
    let (train, query, gallery) = data.statistics();
    misc::write_csv(
        writer,
        &[("train", train), ("query", query), ("gallery", gallery)],
    )
}

/// One line per dataset, printed instead of the table when `--quiet` is set.
fn summary_line(data: &dyn Dataset) -> String {
    let (train, query, gallery) = data.statistics();
    let splits = [("train", train), ("query", query), ("gallery", gallery)]
        .iter()
        .map(|(subset, info)| {
            let (pids, imgs, cams) = info.as_tuple();
            format!("{subset} {pids} ids / {imgs} images / {cams} cameras")
        })
        .join(", ");
    format!("{}: {splits}", data.name())
}

fn unknown_action(action: &str) -> Box<dyn Error> {
    format!(
        "Unknown --action {action}, possible values: {}",
        ACTIONS.join(", ")
    )
    .into()
}

fn load_config(args: &mut Arguments) -> Result<DatasetConfig, Box<dyn Error>> {
    let mut config = match args.opt_value_from_str::<&str, PathBuf>("--config")? {
        Some(path) => DatasetConfig::load(&path)?,
        None => DatasetConfig::default(),
    };

    if let Some(name) = args.opt_value_from_str::<&str, String>("--data")? {
        config.name = name;
    }
    if let Some(root) = args.opt_value_from_str::<&str, PathBuf>("--root")? {
        config.root = root;
    }
    if args.contains("--quiet") {
        config.verbose = false;
    }
    Ok(config)
}

fn run_action(
    action: &str,
    data: &dyn Dataset,
    out: Option<&Path>,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    match action {
        // the table was already printed while loading
        "summary" if verbose => {}
        "summary" => println!("{}", summary_line(data)),
        "show" => data.show_summary(),
        "export" => match out {
            Some(out) => export(data, out)?,
            None => return Err("Expected an output file for export: --out <file.json>".into()),
        },
        "stats-csv" => stats_csv(data, std::io::stdout())?,
        a => return Err(unknown_action(a)),
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = pico_args::Arguments::from_env();
    let registry = Registry::with_builtin();

    let action = args
        .opt_value_from_str::<&str, String>("--action")?
        .unwrap_or_else(|| "summary".into());
    let out = args.opt_value_from_str::<&str, PathBuf>("--out")?;
    let config = load_config(&mut args)?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        log::warn!("Ignoring unused arguments: {remaining:?}");
    }

    if !ACTIONS.contains(&action.as_str()) {
        return Err(unknown_action(&action));
    }

    if action == "list" {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let data = registry.build(&config.name, &config)?;
    run_action(&action, data.as_ref(), out.as_deref(), config.verbose)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
