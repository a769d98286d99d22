mod auth;
mod images;
mod records;
mod tissue_requests;

pub use images::{get_image, serve_image};
pub use records::{add_record_page, delete_record, insert_single_row_data};
pub use tissue_requests::{revert_archive_tissue_requests, revert_request_script};
