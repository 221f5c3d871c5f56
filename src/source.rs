//! Columnar storage of the input events
//!
//! Events are stored column by column, as produced by the upstream ntuplizer:
//! every column holds one entry per event, which is either a scalar (e.g. an
//! object count) or an array of per-object values. Columns are bound once, by
//! name and type, when the analysis is set up. Afterwards, reading the current
//! event's data only involves indexing into already validated storage.
//!
//! The input is a ROOT TTree, read with `oxyroot`. Only the branches which are
//! actually bound get loaded in memory, each of them exactly once.

use crate::{error::DataError, numeric::Float, Result};

use eyre::eyre;
use log::debug;
use oxyroot::{Branch, Named, ReaderTree, RootFile};

use std::{collections::HashMap, fmt, path::Path, sync::OnceLock};

/// Column of event data, as held in memory
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// One integer per event
    Int(Vec<i32>),

    /// One floating-point number per event
    Float(Vec<Float>),

    /// One array of integers per event
    IntArray(Vec<Vec<i32>>),

    /// One array of floating-point numbers per event
    FloatArray(Vec<Vec<Float>>),

    /// One array of booleans per event
    BoolArray(Vec<Vec<bool>>),
}
//
impl Column {
    /// Number of events covered by this column
    pub fn num_entries(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::IntArray(v) => v.len(),
            Column::FloatArray(v) => v.len(),
            Column::BoolArray(v) => v.len(),
        }
    }

    /// Kind of data stored in this column
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Int(_) => "int",
            Column::Float(_) => "float",
            Column::IntArray(_) => "int_array",
            Column::FloatArray(_) => "float_array",
            Column::BoolArray(_) => "bool_array",
        }
    }
}

/// Element types which can be read out of a column
pub trait ColumnType: Copy + 'static {
    /// Kind of a column holding one such value per event
    const SCALAR_KIND: &'static str;

    /// Kind of a column holding one array of such values per event
    const ARRAY_KIND: &'static str;

    /// Access per-event scalars, if the column holds them
    fn scalars(column: &Column) -> Option<&[Self]>;

    /// Access per-event arrays, if the column holds them
    fn arrays(column: &Column) -> Option<&[Vec<Self>]>;
}

impl ColumnType for i32 {
    const SCALAR_KIND: &'static str = "int";
    const ARRAY_KIND: &'static str = "int_array";

    fn scalars(column: &Column) -> Option<&[Self]> {
        match column {
            Column::Int(v) => Some(v),
            _ => None,
        }
    }

    fn arrays(column: &Column) -> Option<&[Vec<Self>]> {
        match column {
            Column::IntArray(v) => Some(v),
            _ => None,
        }
    }
}

impl ColumnType for Float {
    const SCALAR_KIND: &'static str = "float";
    const ARRAY_KIND: &'static str = "float_array";

    fn scalars(column: &Column) -> Option<&[Self]> {
        match column {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    fn arrays(column: &Column) -> Option<&[Vec<Self>]> {
        match column {
            Column::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl ColumnType for bool {
    // Per-event booleans are not produced upstream
    const SCALAR_KIND: &'static str = "bool";
    const ARRAY_KIND: &'static str = "bool_array";

    fn scalars(_column: &Column) -> Option<&[Self]> {
        None
    }

    fn arrays(column: &Column) -> Option<&[Vec<Self>]> {
        match column {
            Column::BoolArray(v) => Some(v),
            _ => None,
        }
    }
}

/// Branch types of the input tree which can be turned into a column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BranchKind {
    Int,
    F32,
    F64,
    IntVector,
    UShortVector,
    F32Vector,
    F64Vector,
    BoolVector,
}

/// Recognize the item type of a branch, as reported by ROOT
fn branch_kind(type_name: &str) -> Option<BranchKind> {
    let normalized = type_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match normalized.as_str() {
        "int" | "int_t" | "int32_t" => Some(BranchKind::Int),
        "float" | "float_t" | "float32_t" => Some(BranchKind::F32),
        "double" | "double_t" | "double32_t" => Some(BranchKind::F64),
        "vector<int>" | "vector<int_t>" | "vector<int32_t>" => Some(BranchKind::IntVector),
        "vector<unsignedshort>" | "vector<ushort_t>" | "vector<uint16_t>" => {
            Some(BranchKind::UShortVector)
        }
        "vector<float>" | "vector<float_t>" => Some(BranchKind::F32Vector),
        "vector<double>" | "vector<double_t>" => Some(BranchKind::F64Vector),
        "vector<bool>" | "vector<bool_t>" => Some(BranchKind::BoolVector),
        _ => None,
    }
}

/// Load a whole branch in memory
fn read_branch(branch: &Branch, kind: BranchKind) -> std::result::Result<Column, DataError> {
    let unreadable = |err: &dyn fmt::Display| DataError::UnreadableColumn {
        name: branch.name().to_owned(),
        reason: err.to_string(),
    };
    macro_rules! values {
        ($item:ty) => {
            branch.as_iter::<$item>().map_err(|err| unreadable(&err))?
        };
    }
    let column = match kind {
        BranchKind::Int => Column::Int(values!(i32).collect()),
        BranchKind::F32 => Column::Float(values!(f32).map(|x| x as Float).collect()),
        BranchKind::F64 => Column::Float(values!(f64).map(|x| x as Float).collect()),
        BranchKind::IntVector => Column::IntArray(values!(Vec<i32>).collect()),
        BranchKind::UShortVector => Column::IntArray(
            values!(Vec<u16>)
                .map(|row| row.into_iter().map(i32::from).collect())
                .collect(),
        ),
        BranchKind::F32Vector => Column::FloatArray(
            values!(Vec<f32>)
                .map(|row| row.into_iter().map(|x| x as Float).collect())
                .collect(),
        ),
        BranchKind::F64Vector => Column::FloatArray(
            values!(Vec<f64>)
                .map(|row| row.into_iter().map(|x| x as Float).collect())
                .collect(),
        ),
        BranchKind::BoolVector => Column::BoolArray(values!(Vec<bool>).collect()),
    };
    Ok(column)
}

/// Check that a column holds exactly one entry per event
fn check_length(
    name: &str,
    column: &Column,
    num_events: usize,
) -> std::result::Result<(), DataError> {
    let len = column.num_entries();
    if len != num_events {
        return Err(DataError::ColumnLength {
            name: name.to_owned(),
            len,
            num_events,
        });
    }
    Ok(())
}

/// Storage slot of one column
#[derive(Debug)]
struct ColumnSlot {
    /// Type of the tree branch backing this column, if any
    branch: Option<BranchKind>,

    /// Column data, once loaded and validated
    data: OnceLock<Column>,
}

/// Columnar event store, validating columns as they are loaded
pub struct EventStore {
    /// Number of events
    num_events: usize,

    /// Input tree, if the columns are read from a file
    tree: Option<ReaderTree>,

    /// Event data, keyed by column name
    columns: HashMap<String, ColumnSlot>,
}
//
impl EventStore {
    /// Open the event tree found at `tree_path` inside of a ROOT input file
    ///
    /// The tree path uses '/' as a directory separator (e.g.
    /// "ggNtuplizer/EventTree"). Branches are only read when first bound.
    ///
    pub fn open(file_name: &Path, tree_path: &str) -> Result<Self> {
        // Open the input file and locate the tree or die trying. The oxyroot
        // error type is not public, so errors are carried by message.
        let mut file = RootFile::open(file_name).map_err(|err| {
            eyre!("Failed to open ROOT file {}: {}", file_name.display(), err)
        })?;
        let tree = file
            .get_tree(tree_path)
            .map_err(|err| eyre!("Failed to open event tree {}: {}", tree_path, err))?;
        let num_events = usize::try_from(tree.entries())
            .map_err(|_| eyre!("Event tree {} reports a negative entry count", tree_path))?;

        // Register the branches that we know how to read
        let mut columns = HashMap::new();
        for branch in tree.branches() {
            let type_name = branch.item_type_name();
            match branch_kind(&type_name) {
                Some(kind) => {
                    columns.insert(
                        branch.name().to_owned(),
                        ColumnSlot {
                            branch: Some(kind),
                            data: OnceLock::new(),
                        },
                    );
                }
                None => debug!("Ignoring branch {} of type {}", branch.name(), type_name),
            }
        }
        debug!(
            "Event tree {} holds {} events and {} usable branches",
            tree_path,
            num_events,
            columns.len()
        );

        Ok(Self {
            num_events,
            tree: Some(tree),
            columns,
        })
    }

    /// Build a store from in-memory columns, checking that every column holds
    /// exactly one entry per event
    pub fn from_columns(
        num_events: usize,
        columns: HashMap<String, Column>,
    ) -> std::result::Result<Self, DataError> {
        let mut slots = HashMap::with_capacity(columns.len());
        for (name, column) in columns {
            check_length(&name, &column, num_events)?;
            let slot = ColumnSlot {
                branch: None,
                data: OnceLock::from(column),
            };
            slots.insert(name, slot);
        }
        Ok(Self {
            num_events,
            tree: None,
            columns: slots,
        })
    }

    /// Number of events in the store
    pub fn num_events(&self) -> usize {
        self.num_events
    }

    /// Bind a column holding one scalar per event
    pub fn scalar<T: ColumnType>(
        &self,
        name: &str,
    ) -> std::result::Result<ScalarColumn<'_, T>, DataError> {
        let (name, column) = self.lookup(name)?;
        let data = T::scalars(column).ok_or_else(|| DataError::ColumnType {
            name: name.to_owned(),
            found: column.kind(),
            expected: T::SCALAR_KIND,
        })?;
        Ok(ScalarColumn { name, data })
    }

    /// Bind a column holding one array per event
    pub fn array<T: ColumnType>(
        &self,
        name: &str,
    ) -> std::result::Result<ArrayColumn<'_, T>, DataError> {
        let (name, column) = self.lookup(name)?;
        let data = T::arrays(column).ok_or_else(|| DataError::ColumnType {
            name: name.to_owned(),
            found: column.kind(),
            expected: T::ARRAY_KIND,
        })?;
        Ok(ArrayColumn { name, data })
    }

    /// Find a column by name, loading it from the input tree if needed
    fn lookup(&self, name: &str) -> std::result::Result<(&str, &Column), DataError> {
        let (name, slot) = self
            .columns
            .get_key_value(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_owned()))?;
        if let Some(column) = slot.data.get() {
            return Ok((name.as_str(), column));
        }

        let branch = self
            .tree
            .as_ref()
            .zip(slot.branch)
            .and_then(|(tree, kind)| Some((tree.branch(name)?, kind)));
        let Some((branch, kind)) = branch else {
            return Err(DataError::MissingColumn(name.clone()));
        };
        let column = read_branch(branch, kind)?;
        check_length(name, &column, self.num_events)?;
        debug!("Loaded column {} ({} events)", name, column.num_entries());
        Ok((name.as_str(), slot.data.get_or_init(|| column)))
    }
}
//
impl fmt::Debug for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStore")
            .field("num_events", &self.num_events)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// Bound column holding one scalar per event
#[derive(Clone, Copy, Debug)]
pub struct ScalarColumn<'store, T> {
    name: &'store str,
    data: &'store [T],
}
//
impl<'store, T: ColumnType> ScalarColumn<'store, T> {
    /// Read the value of this column for one event
    pub fn get(&self, event: usize) -> std::result::Result<T, DataError> {
        self.data
            .get(event)
            .copied()
            .ok_or(DataError::EventOutOfRange {
                event,
                num_events: self.data.len(),
            })
    }
}
//
impl<'store> ScalarColumn<'store, i32> {
    /// Read an object count, which must not be negative
    pub fn count(&self, event: usize) -> std::result::Result<usize, DataError> {
        let value = self.get(event)?;
        usize::try_from(value).map_err(|_| DataError::NegativeCount {
            column: self.name.to_owned(),
            event,
            value,
        })
    }
}

/// Bound column holding one array of per-object values per event
#[derive(Clone, Copy, Debug)]
pub struct ArrayColumn<'store, T> {
    name: &'store str,
    data: &'store [Vec<T>],
}
//
impl<'store, T: ColumnType> ArrayColumn<'store, T> {
    /// Access the values of this column for one event
    pub fn row(&self, event: usize) -> std::result::Result<&'store [T], DataError> {
        self.data
            .get(event)
            .map(Vec::as_slice)
            .ok_or(DataError::EventOutOfRange {
                event,
                num_events: self.data.len(),
            })
    }

    /// Read the value of one object in one event
    ///
    /// Fails if the event's array is too short, which means that the column
    /// disagrees with its category's object count.
    ///
    pub fn get(&self, event: usize, index: usize) -> std::result::Result<T, DataError> {
        let row = self.row(event)?;
        row.get(index).copied().ok_or_else(|| DataError::ShortArray {
            column: self.name.to_owned(),
            event,
            index,
            len: row.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use oxyroot::WriterTree;
    use std::{fs, path::PathBuf};

    fn small_store() -> EventStore {
        let columns = [
            ("nJet".to_owned(), Column::Int(vec![2, -1])),
            ("jetPt".to_owned(), Column::FloatArray(vec![vec![30., 20.], vec![]])),
            ("genMET".to_owned(), Column::Float(vec![12., 5.])),
        ];
        EventStore::from_columns(2, columns.into_iter().collect()).unwrap()
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}.root", name, std::process::id()))
    }

    #[test]
    fn binding_checks_presence_and_type() {
        let store = small_store();
        assert!(store.scalar::<i32>("nJet").is_ok());
        assert!(store.array::<Float>("jetPt").is_ok());
        assert_eq!(
            store.array::<Float>("jetEta").unwrap_err(),
            DataError::MissingColumn("jetEta".to_owned())
        );
        assert_eq!(
            store.array::<i32>("jetPt").unwrap_err(),
            DataError::ColumnType {
                name: "jetPt".to_owned(),
                found: "float_array",
                expected: "int_array",
            }
        );
        assert!(store.scalar::<bool>("nJet").is_err());
    }

    #[test]
    fn columns_must_cover_every_event() {
        let columns = [("nJet".to_owned(), Column::Int(vec![1, 2, 3]))];
        assert_eq!(
            EventStore::from_columns(2, columns.into_iter().collect()).unwrap_err(),
            DataError::ColumnLength {
                name: "nJet".to_owned(),
                len: 3,
                num_events: 2,
            }
        );
    }

    #[test]
    fn per_event_reads_fail_loudly() {
        let store = small_store();
        let n_jet = store.scalar::<i32>("nJet").unwrap();
        let jet_pt = store.array::<Float>("jetPt").unwrap();

        assert_eq!(n_jet.count(0), Ok(2));
        assert!(matches!(
            n_jet.count(1),
            Err(DataError::NegativeCount { value: -1, event: 1, .. })
        ));
        assert_eq!(jet_pt.get(0, 1), Ok(20.));
        assert_eq!(
            jet_pt.get(1, 0),
            Err(DataError::ShortArray {
                column: "jetPt".to_owned(),
                event: 1,
                index: 0,
                len: 0,
            })
        );
        assert!(matches!(
            n_jet.get(2),
            Err(DataError::EventOutOfRange { event: 2, num_events: 2 })
        ));
    }

    #[test]
    fn branch_types_map_to_column_kinds() {
        assert_eq!(branch_kind("Int_t"), Some(BranchKind::Int));
        assert_eq!(branch_kind("int32_t"), Some(BranchKind::Int));
        assert_eq!(branch_kind("float"), Some(BranchKind::F32));
        assert_eq!(branch_kind("Double_t"), Some(BranchKind::F64));
        assert_eq!(branch_kind("vector<int>"), Some(BranchKind::IntVector));
        assert_eq!(branch_kind("vector<UShort_t>"), Some(BranchKind::UShortVector));
        assert_eq!(branch_kind("vector<unsigned short>"), Some(BranchKind::UShortVector));
        assert_eq!(branch_kind("vector<float>"), Some(BranchKind::F32Vector));
        assert_eq!(branch_kind("vector<float >"), Some(BranchKind::F32Vector));
        assert_eq!(branch_kind("vector<bool>"), Some(BranchKind::BoolVector));
        assert_eq!(branch_kind("ULong64_t"), None);
        assert_eq!(branch_kind("vector<vector<float>>"), None);
    }

    #[test]
    fn open_reads_bound_branches() {
        let path = scratch_path("ditau-source-open");
        {
            let mut file = RootFile::create(&path).unwrap();
            let mut tree = WriterTree::new("EventTree");
            tree.new_branch("nJet".to_owned(), vec![1i32, 0, 3].into_iter());
            tree.new_branch("genMET".to_owned(), vec![12.5f32, 0.25, 40.].into_iter());
            tree.write(&mut file).unwrap();
            file.close().unwrap();
        }

        let store = EventStore::open(&path, "EventTree").unwrap();
        assert_eq!(store.num_events(), 3);
        let n_jet = store.scalar::<i32>("nJet").unwrap();
        assert_eq!(n_jet.count(2), Ok(3));
        let gen_met = store.scalar::<Float>("genMET").unwrap();
        assert_eq!(gen_met.get(1), Ok(0.25));
        assert_eq!(
            store.scalar::<Float>("nJet").unwrap_err(),
            DataError::ColumnType {
                name: "nJet".to_owned(),
                found: "int",
                expected: "float",
            }
        );
        assert_eq!(
            store.array::<Float>("jetPt").unwrap_err(),
            DataError::MissingColumn("jetPt".to_owned())
        );

        assert!(EventStore::open(&path, "ggNtuplizer/Missing").is_err());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn open_rejects_unreadable_inputs() {
        let path = scratch_path("ditau-source-garbage");
        fs::write(&path, "this is not a ROOT file").unwrap();
        assert!(EventStore::open(&path, "EventTree").is_err());
        fs::remove_file(path).unwrap();
        assert!(EventStore::open(Path::new("/nonexistent/ditau.root"), "EventTree").is_err());
    }
}
