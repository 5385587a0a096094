pub mod walk;

pub use walk::{collect_files, scan_folder_structure, WalkReport};
