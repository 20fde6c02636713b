//! Built-in action names.

pub const SEND_PRIVATE_MSG: &str = "send_private_msg";
pub const SEND_GROUP_MSG: &str = "send_group_msg";
pub const SEND_MSG: &str = "send_msg";
pub const DELETE_MSG: &str = "delete_msg";
pub const GET_MSG: &str = "get_msg";
pub const GET_FORWARD_MSG: &str = "get_forward_msg";
pub const SEND_LIKE: &str = "send_like";
pub const SET_GROUP_KICK: &str = "set_group_kick";
pub const SET_GROUP_BAN: &str = "set_group_ban";
pub const SET_GROUP_ANONYMOUS_BAN: &str = "set_group_anonymous_ban";
pub const SET_GROUP_WHOLE_BAN: &str = "set_group_whole_ban";
pub const SET_GROUP_ADMIN: &str = "set_group_admin";
pub const SET_GROUP_ANONYMOUS: &str = "set_group_anonymous";
pub const SET_GROUP_CARD: &str = "set_group_card";
pub const SET_GROUP_NAME: &str = "set_group_name";
pub const SET_GROUP_LEAVE: &str = "set_group_leave";
pub const SET_GROUP_SPECIAL_TITLE: &str = "set_group_special_title";
pub const SET_FRIEND_ADD_REQUEST: &str = "set_friend_add_request";
pub const SET_GROUP_ADD_REQUEST: &str = "set_group_add_request";
pub const GET_LOGIN_INFO: &str = "get_login_info";
pub const GET_STRANGER_INFO: &str = "get_stranger_info";
pub const GET_FRIEND_LIST: &str = "get_friend_list";
pub const GET_GROUP_INFO: &str = "get_group_info";
pub const GET_GROUP_LIST: &str = "get_group_list";
pub const GET_GROUP_MEMBER_INFO: &str = "get_group_member_info";
pub const GET_GROUP_MEMBER_LIST: &str = "get_group_member_list";
pub const GET_GROUP_HONOR_INFO: &str = "get_group_honor_info";
pub const GET_COOKIES: &str = "get_cookies";
pub const GET_CSRF_TOKEN: &str = "get_csrf_token";
pub const GET_CREDENTIALS: &str = "get_credentials";
pub const GET_RECORD: &str = "get_record";
pub const GET_IMAGE: &str = "get_image";
pub const CAN_SEND_IMAGE: &str = "can_send_image";
pub const CAN_SEND_RECORD: &str = "can_send_record";
pub const GET_STATUS: &str = "get_status";
pub const GET_VERSION_INFO: &str = "get_version_info";
pub const SET_RESTART: &str = "set_restart";
pub const CLEAN_CACHE: &str = "clean_cache";
pub const HANDLE_QUICK_OPERATION: &str = ".handle_quick_operation";
