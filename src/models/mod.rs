pub mod answer_key;
pub mod answers;
pub mod detection;
pub mod geometry;
pub mod identity;
pub mod layout;
pub mod loaders;
pub mod result;
pub mod roster;
pub mod sheet;

pub use answer_key::{normalize_variant_code, AnswerKeyEntry, AnswerKeyTable};
pub use answers::AssembledAnswers;
pub use detection::{AnswerCluster, Detection};
pub use geometry::{BoundingBox, Rect};
pub use identity::{IdentitySignal, MatchStatus, ReconciledIdentity};
pub use layout::SheetLayout;
pub use loaders::{list_sheet_images, load_answer_key, load_layout, load_roster};
pub use result::{GradingResult, SheetIssue};
pub use roster::{Roster, RosterEntry};
pub use sheet::{Region, RegionName, RegionSet, SheetImage};
