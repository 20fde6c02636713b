//! NapCat action names.

pub const SET_QQ_AVATAR: &str = "set_qq_avatar";
pub const GET_GROUP_SYSTEM_MSG: &str = "get_group_system_msg";
pub const GET_FILE: &str = "get_file";
pub const DOWNLOAD_FILE: &str = "download_file";
