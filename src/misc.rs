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

use std::io::Write;

use itertools::Itertools;

use crate::Sample;

const RULE: &str = "  ----------------------------------------";

/// Aggregate numbers of a single split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageDataInfo {
    /// distinct identities
    pub num_pids: usize,

    /// samples
    pub num_imgs: usize,

    /// distinct cameras / views
    pub num_cams: usize,
}

impl ImageDataInfo {
    pub fn new(data: &[Sample]) -> Self {
        let num_pids = data.iter().map(|(_, pid, _)| pid).unique().count();
        let num_cams = data.iter().map(|(_, _, camid)| camid).unique().count();
        Self {
            num_pids,
            num_imgs: data.len(),
            num_cams,
        }
    }

    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (self.num_pids, self.num_imgs, self.num_cams)
    }
}

/// Renders the train/query/gallery table shown after a dataset is loaded.
pub fn format_dataset_statistics(
    train: &ImageDataInfo,
    query: &ImageDataInfo,
    gallery: &ImageDataInfo,
) -> String {
    let mut out = String::new();
    out.push_str("Dataset statistics:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str("  subset   | # ids | # images | # cameras\n");
    out.push_str(RULE);
    out.push('\n');
    for (subset, info) in [("train", train), ("query", query), ("gallery", gallery)] {
        out.push_str(&format!(
            "  {:<8} | {:>5} | {:>8} | {:>9}\n",
            subset, info.num_pids, info.num_imgs, info.num_cams
        ));
    }
    out.push_str(RULE);
    out
}

pub fn print_dataset_statistics(
    train: &ImageDataInfo,
    query: &ImageDataInfo,
    gallery: &ImageDataInfo,
) {
    println!("{}", format_dataset_statistics(train, query, gallery));
}

/// Writes `subset;num_pids;num_imgs;num_cams` rows.
pub fn write_csv<W: Write>(writer: W, rows: &[(&str, ImageDataInfo)]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    wtr.write_record(["subset", "num_pids", "num_imgs", "num_cams"])?;
    for (subset, info) in rows {
        wtr.write_record([
            subset.to_string(),
            info.num_pids.to_string(),
            info.num_imgs.to_string(),
            info.num_cams.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
