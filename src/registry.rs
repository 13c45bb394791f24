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

use std::{collections::HashMap, fmt};

use itertools::Itertools;

use crate::building::{self, Building};
use crate::config::DatasetConfig;
use crate::Dataset;

/// Builds a dataset from its config.
pub type Factory = fn(&DatasetConfig) -> Result<Box<dyn Dataset>, building::Error>;

#[derive(Debug)]
pub enum Error {
    /// No factory registered under this name
    UnknownDataset(String),

    /// Name is already taken
    AlreadyRegistered(String),

    /// The factory failed
    Dataset(building::Error),
}

impl From<building::Error> for Error {
    fn from(value: building::Error) -> Self {
        Self::Dataset(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownDataset(name) => write!(f, "unknown dataset \"{name}\""),
            Error::AlreadyRegistered(name) => write!(f, "dataset \"{name}\" registered twice"),
            Error::Dataset(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

fn load_building(config: &DatasetConfig) -> Result<Box<dyn Dataset>, building::Error> {
    let dataset: Box<dyn Dataset> = Box::new(Building::new(&config.root, config.verbose)?);
    Ok(dataset)
}

/// Maps dataset names to their factories.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every dataset shipped with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .entries
            .insert(Building::DATASET_NAME.into(), load_building);
        registry
    }

    pub fn register(&mut self, name: &str, factory: Factory) -> Result<(), Error> {
        if self.entries.contains_key(name) {
            return Err(Error::AlreadyRegistered(name.into()));
        }
        self.entries.insert(name.into(), factory);
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).sorted().collect()
    }

    /// Looks up `name` and builds the dataset with `config`.
    pub fn build(&self, name: &str, config: &DatasetConfig) -> Result<Box<dyn Dataset>, Error> {
        let factory = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UnknownDataset(name.into()))?;
        log::debug!("Building dataset {name} from {}", config.root.display());
        Ok(factory(config)?)
    }
}
