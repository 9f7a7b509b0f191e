mod marker;
mod naming;
mod restore_point;

pub use marker::{format_marker, parse_marker};
pub use naming::{
    dump_file_name, last_restore_file_name, meta_file_name, parse_dump_file_name,
    restore_point_id, DumpFileName, DUMP_TIMESTAMP_FORMAT, LOCK_FILE_NAME, META_EXTENSION,
};
pub use restore_point::{parse_metadata, sort_by_timestamp, Metadata, RestorePoint};
