pub mod file_handler;

pub use file_handler::{
    __path_delete_file, __path_file_exists, __path_get_file_content, __path_get_file_size,
    __path_list_files, __path_upload_file, delete_file, file_exists, get_file_content,
    get_file_size, list_files, upload_file,
};
