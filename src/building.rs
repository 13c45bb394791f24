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

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use regex::Regex;

use crate::misc::{self, ImageDataInfo};
use crate::{Dataset, Sample};

/// `<prefix><pid>_<sat|side>_<camid>.jpg`, matched against the file name only.
/// A junk `-1` pid is only recognized at the start of the name.
const FILENAME_PATTERN: &str = r"^(?:(-1)|.*?(\d+))_(sat|side)_(\d+)\.jpg$";

const JUNK_PID: i64 = -1;

#[derive(Debug)]
/// All possible errors while loading the building dataset
pub enum Error {
    /// A required directory does not exist
    MissingPath(PathBuf),

    /// A file name does not follow the `<pid>_<sat|side>_<camid>.jpg` scheme
    PatternMismatch(PathBuf),

    /// Only `all`, `side` and `sat` are valid split types
    InvalidSelector(String),

    /// Directory could not be listed
    Io(std::io::Error),

    /// Directory name can't be turned into a `*.jpg` glob
    Glob(glob::PatternError),

    Regex(regex::Error),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<glob::GlobError> for Error {
    fn from(value: glob::GlobError) -> Self {
        Self::Io(value.into_error())
    }
}

impl From<glob::PatternError> for Error {
    fn from(value: glob::PatternError) -> Self {
        Self::Glob(value)
    }
}

impl From<regex::Error> for Error {
    fn from(value: regex::Error) -> Self {
        Self::Regex(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingPath(path) => write!(f, "\"{}\" is not available", path.display()),
            Error::PatternMismatch(path) => write!(
                f,
                "\"{}\" does not match <pid>_<sat|side>_<camid>.jpg",
                path.display()
            ),
            Error::InvalidSelector(kind) => {
                write!(f, "invalid split type \"{kind}\", expected all, side or sat")
            }
            Error::Io(e) => write!(f, "{e}"),
            Error::Glob(e) => write!(f, "{e}"),
            Error::Regex(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

/// View encoded in a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Sat,
    Side,
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sat" => Ok(Category::Sat),
            "side" => Ok(Category::Side),
            _ => Err(()),
        }
    }
}

/// Which images of a directory end up in a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSelector {
    All,
    Only(Category),
}

impl ViewSelector {
    fn accepts(&self, category: Category) -> bool {
        match self {
            ViewSelector::All => true,
            ViewSelector::Only(c) => *c == category,
        }
    }
}

impl FromStr for ViewSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(ViewSelector::All);
        }
        s.parse::<Category>()
            .map(ViewSelector::Only)
            .map_err(|_| Error::InvalidSelector(s.into()))
    }
}

/// Directories of the dataset below `root`.
#[derive(Debug, Clone)]
pub struct Layout {
    pub dataset_dir: PathBuf,
    pub train_dir: PathBuf,
    pub query_dir: PathBuf,
    pub gallery_dir: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let dataset_dir = root.as_ref().join(Building::DATASET_DIR);
        Self {
            train_dir: dataset_dir.join("train"),
            // query and gallery share the test images, split by view
            query_dir: dataset_dir.join("test"),
            gallery_dir: dataset_dir.join("test"),
            dataset_dir,
        }
    }

    /// Checks that every directory is available before scanning.
    ///
    /// # Errors
    /// - `Error::MissingPath` for the first absent directory, in the order dataset, train,
    /// query, gallery
    pub fn check_before_run(&self) -> Result<(), Error> {
        for dir in [
            &self.dataset_dir,
            &self.train_dir,
            &self.query_dir,
            &self.gallery_dir,
        ] {
            if !dir.exists() {
                return Err(Error::MissingPath(dir.clone()));
            }
        }
        Ok(())
    }
}

/// Extracts `(pid, category, camid)` from a file name.
fn parse_filename(pattern: &Regex, name: &str) -> Option<(i64, Category, u64)> {
    let caps = pattern.captures(name)?;
    let pid = match caps.get(1) {
        Some(_) => JUNK_PID,
        None => caps.get(2)?.as_str().parse::<i64>().ok()?,
    };
    let category = caps[3].parse::<Category>().ok()?;
    let camid = caps[4].parse::<u64>().ok()?;
    Some((pid, category, camid))
}

/// Lists `*.jpg` files directly inside `dir_path`. Hidden files are skipped.
fn list_images(dir_path: &Path) -> Result<Vec<PathBuf>, Error> {
    let dir = glob::Pattern::escape(&dir_path.to_string_lossy());
    let full_pattern = Path::new(&dir).join("*.jpg");

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };

    let mut img_paths = Vec::new();
    for entry in glob::glob_with(&full_pattern.to_string_lossy(), options)? {
        let path = entry?;
        if path.is_file() {
            img_paths.push(path);
        }
    }
    Ok(img_paths)
}

/// Scans `dir_path` and returns the samples matching `kind` (`all`, `side` or `sat`).
///
/// Junk images (pid -1) are ignored. Samples come in glob order, sorted by file name.
///
/// # Errors
/// - `Error::InvalidSelector` if `kind` is unknown
/// - `Error::PatternMismatch` for the first file name not following the naming scheme
/// - `Error::Io` if an entry of the directory can't be read
pub fn process_dir<P: AsRef<Path>>(dir_path: P, kind: &str) -> Result<Vec<Sample>, Error> {
    let dir_path = dir_path.as_ref();
    let selector = kind.parse::<ViewSelector>()?;
    let pattern = Regex::new(FILENAME_PATTERN)?;

    log::debug!("Scanning {} for {kind} images", dir_path.display());

    let mut dataset = Vec::new();
    for img_path in list_images(dir_path)? {
        let name = img_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some((pid, category, camid)) = parse_filename(&pattern, &name) else {
            log::warn!("Unexpected file name {}", img_path.display());
            return Err(Error::PatternMismatch(img_path));
        };

        if pid == JUNK_PID {
            continue;
        }
        if selector.accepts(category) {
            dataset.push((img_path, pid, camid));
        }
    }

    Ok(dataset)
}

/// Building re-identification dataset.
///
/// Side-view test images are the queries, satellite-view test images form the gallery.
pub struct Building {
    pub train: Vec<Sample>,
    pub query: Vec<Sample>,
    pub gallery: Vec<Sample>,

    pub train_info: ImageDataInfo,
    pub query_info: ImageDataInfo,
    pub gallery_info: ImageDataInfo,
}

impl Building {
    pub const DATASET_DIR: &'static str = "building";
    pub const DATASET_NAME: &'static str = "building";

    /// Loads all three splits from `<root>/building`.
    ///
    /// # Arguments
    /// - `root`: directory containing the `building` folder
    /// - `verbose`: print the statistics table after loading
    pub fn new<P: AsRef<Path>>(root: P, verbose: bool) -> Result<Self, Error> {
        let layout = Layout::new(root);
        layout.check_before_run()?;

        let train = process_dir(&layout.train_dir, "all")?;
        let query = process_dir(&layout.query_dir, "side")?;
        let gallery = process_dir(&layout.gallery_dir, "sat")?;

        let train_info = ImageDataInfo::new(&train);
        let query_info = ImageDataInfo::new(&query);
        let gallery_info = ImageDataInfo::new(&gallery);

        if verbose {
            println!("=> Building loaded");
            misc::print_dataset_statistics(&train_info, &query_info, &gallery_info);
        }

        log::info!(
            "Loaded {} train, {} query and {} gallery images",
            train_info.num_imgs,
            query_info.num_imgs,
            gallery_info.num_imgs
        );

        Ok(Self {
            train,
            query,
            gallery,
            train_info,
            query_info,
            gallery_info,
        })
    }
}

impl Dataset for Building {
    fn train(&self) -> &[Sample] {
        &self.train
    }

    fn query(&self) -> &[Sample] {
        &self.query
    }

    fn gallery(&self) -> &[Sample] {
        &self.gallery
    }

    fn name(&self) -> String {
        Self::DATASET_NAME.into()
    }

    fn statistics(&self) -> (ImageDataInfo, ImageDataInfo, ImageDataInfo) {
        (self.train_info, self.query_info, self.gallery_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn pids(samples: &[Sample]) -> Vec<i64> {
        let mut pids = samples.iter().map(|(_, pid, _)| *pid).collect::<Vec<_>>();
        pids.sort();
        pids
    }

    fn example_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        touch(
            tmp.path(),
            &["0001_sat_001.jpg", "0002_side_003.jpg", "-1_sat_009.jpg"],
        );
        tmp
    }

    fn building_root(train: &[&str], test: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("building/train"), train);
        touch(&tmp.path().join("building/test"), test);
        tmp
    }

    #[test]
    fn parses_ids_from_file_name() {
        let pattern = Regex::new(FILENAME_PATTERN).unwrap();
        assert_eq!(
            Some((12, Category::Side, 7)),
            parse_filename(&pattern, "12_side_007.jpg")
        );
        assert_eq!(
            Some((345, Category::Sat, 2)),
            parse_filename(&pattern, "img_0345_sat_2.jpg")
        );
        assert_eq!(
            Some((-1, Category::Sat, 9)),
            parse_filename(&pattern, "-1_sat_009.jpg")
        );
        assert_eq!(None, parse_filename(&pattern, "12_top_007.jpg"));
        assert_eq!(None, parse_filename(&pattern, "_sat_007.jpg"));
        assert_eq!(None, parse_filename(&pattern, "12_sat_.jpg"));
        assert_eq!(None, parse_filename(&pattern, "12_sat_007.jpeg"));
    }

    #[test]
    fn selector_from_str() {
        assert_eq!(ViewSelector::All, "all".parse::<ViewSelector>().unwrap());
        assert_eq!(
            ViewSelector::Only(Category::Side),
            "side".parse::<ViewSelector>().unwrap()
        );
        assert_eq!(
            ViewSelector::Only(Category::Sat),
            "sat".parse::<ViewSelector>().unwrap()
        );
        assert!(matches!(
            "front".parse::<ViewSelector>(),
            Err(Error::InvalidSelector(s)) if s == "front"
        ));
    }

    #[test]
    fn all_keeps_every_non_junk_sample() {
        let tmp = example_dir();
        let samples = process_dir(tmp.path(), "all").unwrap();

        assert_eq!(vec![1, 2], pids(&samples));
        assert!(samples.iter().all(|(_, pid, _)| *pid != JUNK_PID));
        assert_eq!((2, 2, 2), ImageDataInfo::new(&samples).as_tuple());
    }

    #[test]
    fn selector_filters_by_category() {
        let tmp = example_dir();

        let sat = process_dir(tmp.path(), "sat").unwrap();
        assert_eq!(1, sat.len());
        assert_eq!(1, sat[0].1);
        assert_eq!(1, sat[0].2);
        assert_eq!(tmp.path().join("0001_sat_001.jpg"), sat[0].0);

        let side = process_dir(tmp.path(), "side").unwrap();
        assert_eq!(1, side.len());
        assert_eq!((2, 3), (side[0].1, side[0].2));
    }

    #[test]
    fn junk_marker_only_at_start_of_name() {
        let tmp = TempDir::new().unwrap();
        touch(
            tmp.path(),
            &["img-1_sat_2.jpg", "img-2_sat_2.jpg", "12-1_side_3.jpg", "-12_sat_4.jpg"],
        );

        let samples = process_dir(tmp.path(), "all").unwrap();
        assert_eq!(vec![1, 1, 2, 12], pids(&samples));
    }

    #[test]
    fn test_images_share_one_directory() {
        let layout = Layout::new("datasets");
        assert_eq!(PathBuf::from("datasets/building"), layout.dataset_dir);
        assert_eq!(PathBuf::from("datasets/building/train"), layout.train_dir);
        assert_eq!(PathBuf::from("datasets/building/test"), layout.query_dir);
        assert_eq!(layout.query_dir, layout.gallery_dir);
    }

    #[test]
    fn directory_names_are_not_glob_patterns() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("[set] *");
        touch(&dir, &["5_side_1.jpg"]);
        touch(&tmp.path().join("s"), &["6_side_1.jpg"]);

        let samples = process_dir(&dir, "side").unwrap();
        assert_eq!(vec![5], pids(&samples));
    }

    #[test]
    fn samples_are_sorted_by_file_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), &["3_sat_1.jpg", "1_sat_1.jpg", "2_sat_1.jpg"]);

        let samples = process_dir(tmp.path(), "sat").unwrap();
        let ids = samples.iter().map(|(_, pid, _)| *pid).collect::<Vec<_>>();
        assert_eq!(vec![1, 2, 3], ids);
    }

    #[test]
    fn ignores_other_files() {
        let tmp = example_dir();
        touch(tmp.path(), &["notes.txt", ".hidden_sat_1.jpg", "3_sat_1.png"]);
        touch(&tmp.path().join("nested"), &["4_sat_1.jpg"]);

        let samples = process_dir(tmp.path(), "all").unwrap();
        assert_eq!(vec![1, 2], pids(&samples));
    }

    #[test]
    fn unexpected_file_name_aborts() {
        let tmp = example_dir();
        touch(tmp.path(), &["cover.jpg"]);

        match process_dir(tmp.path(), "all") {
            Err(Error::PatternMismatch(path)) => {
                assert_eq!(tmp.path().join("cover.jpg"), path)
            }
            other => panic!("expected pattern mismatch, got {other:?}"),
        }
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let tmp = example_dir();
        assert!(matches!(
            process_dir(tmp.path(), "top"),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn empty_directory_gives_empty_split() {
        let tmp = TempDir::new().unwrap();
        let samples = process_dir(tmp.path(), "all").unwrap();
        assert!(samples.is_empty());
        assert_eq!((0, 0, 0), ImageDataInfo::new(&samples).as_tuple());
    }

    #[test]
    fn loads_splits() {
        let tmp = building_root(
            &["1_sat_1.jpg", "1_side_2.jpg", "2_side_2.jpg", "-1_side_1.jpg"],
            &["5_sat_1.jpg", "5_side_2.jpg", "6_side_3.jpg", "x7_sat_1.jpg"],
        );
        let building = Building::new(tmp.path(), false).unwrap();

        assert_eq!(vec![1, 1, 2], pids(&building.train));
        assert_eq!(vec![5, 6], pids(&building.query));
        assert_eq!(vec![5, 7], pids(&building.gallery));

        assert_eq!((2, 3, 2), building.train_info.as_tuple());
        assert_eq!((2, 2, 2), building.query_info.as_tuple());
        assert_eq!((2, 2, 1), building.gallery_info.as_tuple());
        assert_eq!("building", building.name());
        assert_eq!(
            (
                building.train_info,
                building.query_info,
                building.gallery_info
            ),
            building.statistics()
        );
    }

    #[test]
    fn missing_directories_are_reported() {
        let tmp = TempDir::new().unwrap();
        let dataset_dir = tmp.path().join("building");

        match Building::new(tmp.path(), false) {
            Err(Error::MissingPath(p)) => assert_eq!(dataset_dir, p),
            _ => panic!("dataset dir should be missing"),
        }

        fs::create_dir_all(&dataset_dir).unwrap();
        match Building::new(tmp.path(), false) {
            Err(Error::MissingPath(p)) => assert_eq!(dataset_dir.join("train"), p),
            _ => panic!("train dir should be missing"),
        }

        fs::create_dir_all(dataset_dir.join("train")).unwrap();
        match Building::new(tmp.path(), false) {
            Err(Error::MissingPath(p)) => assert_eq!(dataset_dir.join("test"), p),
            _ => panic!("test dir should be missing"),
        }

        fs::create_dir_all(dataset_dir.join("test")).unwrap();
        assert!(Building::new(tmp.path(), false).is_ok());
    }

    #[test]
    fn bad_test_image_fails_construction() {
        let tmp = building_root(&["1_sat_1.jpg"], &["5_sat_1.jpg", "5_front_1.jpg"]);
        assert!(matches!(
            Building::new(tmp.path(), false),
            Err(Error::PatternMismatch(_))
        ));
    }
}
