pub mod entry_points;
pub mod frameworks;

pub use entry_points::{is_test_file, score_entry_point, EntryPointScore, EntryPointSignal};
pub use frameworks::{detect_from_ast, detect_from_path, FrameworkHint};
