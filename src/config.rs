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

use std::{fmt, path::PathBuf};

use serde::Deserialize;

#[derive(Debug)]
/// Defines all possible errors while reading a config file.
pub enum Error {
    /// Config file could not be read
    Io(std::io::Error),

    /// Data could not be deserialized
    DeserializeError(serde_json::Error),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::DeserializeError(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "could not read config: {e}"),
            Error::DeserializeError(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

/// Selects a registered dataset and where its files live.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// Registry key, e.g. `building`
    pub name: String,

    /// Folder containing the dataset directories
    pub root: PathBuf,

    /// Print the statistics table after loading
    pub verbose: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: "building".into(),
            root: PathBuf::from("datasets"),
            verbose: true,
        }
    }
}

impl DatasetConfig {
    /// Reads a JSON config. Missing fields keep their default.
    pub fn load(path: &PathBuf) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&data)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
