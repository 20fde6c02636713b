//! Action → response type mapping.
//!
//! Each caller owns one [`ActionRegistry`]. Looking up the decoder for an
//! action tries the built-in table first, then registered extensions, and
//! finally falls back to a plain [`serde_json::Value`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tabby_core::api::{Extension, ResponseFactory};
//!
//! let ext = Extension::new("napcat")
//!     .with_action("get_file", ResponseFactory::of::<FileInfo>());
//! client.register_extension(ext)?;
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::action;
use super::response::{
    Cookies, Credentials, CsrfToken, FilePath, FriendList, GroupHonorInfo, GroupInfo, GroupList,
    GroupMemberInfo, GroupMemberList, LoginInfo, MessageData, MessageIdData, MessageOnlyData,
    Payload, ServerStatus, StrangerInfo, VersionInfo, Void, YesOrNo,
};
use crate::error::RegistryError;

/// Owner name reported for built-in actions.
pub const BUILTIN_OWNER: &str = "builtin";

// ============================================================================
// ResponseFactory
// ============================================================================

type DecodeFn = dyn Fn(Value) -> serde_json::Result<Payload> + Send + Sync;

/// Decodes the `data` field of a response into a concrete type.
#[derive(Clone)]
pub struct ResponseFactory {
    decode: Arc<DecodeFn>,
    type_name: &'static str,
}

impl ResponseFactory {
    /// A factory decoding `data` as `T`.
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        Self {
            decode: Arc::new(|data| serde_json::from_value::<T>(data).map(Payload::new)),
            type_name: type_name::<T>(),
        }
    }

    /// Decodes `data`.
    pub fn decode(&self, data: Value) -> serde_json::Result<Payload> {
        (self.decode)(data)
    }

    /// Name of the type this factory produces.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ResponseFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResponseFactory").field(&self.type_name).finish()
    }
}

// ============================================================================
// Extension
// ============================================================================

/// A named bundle of extra actions, registered all at once.
#[derive(Debug, Clone)]
pub struct Extension {
    name: String,
    actions: Vec<(String, ResponseFactory)>,
}

impl Extension {
    /// Creates an empty extension.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Adds an action. A later entry for the same action replaces an earlier one.
    pub fn with_action(mut self, action: impl Into<String>, factory: ResponseFactory) -> Self {
        let action = action.into();
        self.actions.retain(|(existing, _)| *existing != action);
        self.actions.push((action, factory));
        self
    }

    /// Adds several actions.
    pub fn with_actions<I, S>(self, actions: I) -> Self
    where
        I: IntoIterator<Item = (S, ResponseFactory)>,
        S: Into<String>,
    {
        actions
            .into_iter()
            .fold(self, |ext, (action, factory)| ext.with_action(action, factory))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over the actions this extension declares.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|(action, _)| action.as_str())
    }
}

// ============================================================================
// ActionRegistry
// ============================================================================

#[derive(Default)]
struct Registered {
    extensions: HashMap<String, Vec<String>>,
    actions: HashMap<String, (String, ResponseFactory)>,
}

/// Maps actions to their response decoders.
pub struct ActionRegistry {
    builtin: HashMap<&'static str, ResponseFactory>,
    registered: RwLock<Registered>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered = self.registered.read();
        f.debug_struct("ActionRegistry")
            .field("builtin", &self.builtin.len())
            .field("extensions", &registered.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ActionRegistry {
    /// Creates a registry holding only the built-in actions.
    pub fn new() -> Self {
        Self {
            builtin: builtin_actions(),
            registered: RwLock::new(Registered::default()),
        }
    }

    /// Registers an extension and all of its actions.
    ///
    /// Fails if the extension name is taken or any of its actions is built in
    /// or owned by another extension. On failure nothing is registered.
    pub fn register_extension(&self, extension: Extension) -> Result<(), RegistryError> {
        let mut registered = self.registered.write();

        if registered.extensions.contains_key(&extension.name) {
            return Err(RegistryError::ExtensionAlreadyRegistered(extension.name));
        }
        for (action, _) in &extension.actions {
            if let Some(owner) = self.owner_locked(&registered, action) {
                return Err(RegistryError::ActionAlreadyRegistered {
                    action: action.clone(),
                    owner,
                });
            }
        }

        let Extension { name, actions } = extension;
        debug!(extension = %name, actions = actions.len(), "Registering API extension");
        let mut names = Vec::with_capacity(actions.len());
        for (action, factory) in actions {
            names.push(action.clone());
            registered.actions.insert(action, (name.clone(), factory));
        }
        registered.extensions.insert(name, names);
        Ok(())
    }

    /// Returns the decoder for an action.
    pub fn factory(&self, action: &str) -> ResponseFactory {
        if let Some(factory) = self.builtin.get(action) {
            return factory.clone();
        }
        self.registered
            .read()
            .actions
            .get(action)
            .map(|(_, factory)| factory.clone())
            .unwrap_or_else(ResponseFactory::of::<Value>)
    }

    /// Returns who owns an action: [`BUILTIN_OWNER`] or an extension name.
    pub fn owner(&self, action: &str) -> Option<String> {
        self.owner_locked(&self.registered.read(), action)
    }

    /// Checks whether an extension with this name is registered.
    pub fn has_extension(&self, name: &str) -> bool {
        self.registered.read().extensions.contains_key(name)
    }

    fn owner_locked(&self, registered: &Registered, action: &str) -> Option<String> {
        if self.builtin.contains_key(action) {
            return Some(BUILTIN_OWNER.to_owned());
        }
        registered.actions.get(action).map(|(owner, _)| owner.clone())
    }
}

fn builtin_actions() -> HashMap<&'static str, ResponseFactory> {
    use action::*;

    let void = ResponseFactory::of::<Void>();
    let message_id = ResponseFactory::of::<MessageIdData>();
    let file = ResponseFactory::of::<FilePath>();
    let yes_or_no = ResponseFactory::of::<YesOrNo>();

    let mut map = HashMap::new();
    for action in [SEND_PRIVATE_MSG, SEND_GROUP_MSG, SEND_MSG] {
        map.insert(action, message_id.clone());
    }
    for action in [
        DELETE_MSG,
        SEND_LIKE,
        SET_GROUP_KICK,
        SET_GROUP_BAN,
        SET_GROUP_ANONYMOUS_BAN,
        SET_GROUP_WHOLE_BAN,
        SET_GROUP_ADMIN,
        SET_GROUP_ANONYMOUS,
        SET_GROUP_CARD,
        SET_GROUP_NAME,
        SET_GROUP_LEAVE,
        SET_GROUP_SPECIAL_TITLE,
        SET_FRIEND_ADD_REQUEST,
        SET_GROUP_ADD_REQUEST,
        SET_RESTART,
        CLEAN_CACHE,
        HANDLE_QUICK_OPERATION,
    ] {
        map.insert(action, void.clone());
    }
    for action in [GET_RECORD, GET_IMAGE] {
        map.insert(action, file.clone());
    }
    for action in [CAN_SEND_IMAGE, CAN_SEND_RECORD] {
        map.insert(action, yes_or_no.clone());
    }
    map.insert(GET_MSG, ResponseFactory::of::<MessageData>());
    map.insert(GET_FORWARD_MSG, ResponseFactory::of::<MessageOnlyData>());
    map.insert(GET_LOGIN_INFO, ResponseFactory::of::<LoginInfo>());
    map.insert(GET_STRANGER_INFO, ResponseFactory::of::<StrangerInfo>());
    map.insert(GET_FRIEND_LIST, ResponseFactory::of::<FriendList>());
    map.insert(GET_GROUP_INFO, ResponseFactory::of::<GroupInfo>());
    map.insert(GET_GROUP_LIST, ResponseFactory::of::<GroupList>());
    map.insert(GET_GROUP_MEMBER_INFO, ResponseFactory::of::<GroupMemberInfo>());
    map.insert(GET_GROUP_MEMBER_LIST, ResponseFactory::of::<GroupMemberList>());
    map.insert(GET_GROUP_HONOR_INFO, ResponseFactory::of::<GroupHonorInfo>());
    map.insert(GET_COOKIES, ResponseFactory::of::<Cookies>());
    map.insert(GET_CSRF_TOKEN, ResponseFactory::of::<CsrfToken>());
    map.insert(GET_CREDENTIALS, ResponseFactory::of::<Credentials>());
    map.insert(GET_STATUS, ResponseFactory::of::<ServerStatus>());
    map.insert(GET_VERSION_INFO, ResponseFactory::of::<VersionInfo>());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, serde::Deserialize)]
    struct Avatar {
        url: String,
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = ActionRegistry::new();
        let payload = registry
            .factory(action::SEND_GROUP_MSG)
            .decode(json!({"message_id": 9}))
            .unwrap();
        assert_eq!(
            payload.downcast_ref::<MessageIdData>().map(|d| d.message_id.get()),
            Some(9)
        );
        assert_eq!(registry.owner(action::GET_STATUS).as_deref(), Some(BUILTIN_OWNER));
    }

    #[test]
    fn test_unknown_action_falls_back_to_value() {
        let registry = ActionRegistry::new();
        let payload = registry
            .factory("get_unknown_thing")
            .decode(json!({"a": 1}))
            .unwrap();
        assert_eq!(payload.downcast_ref::<Value>(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_extension_lookup() {
        let registry = ActionRegistry::new();
        registry
            .register_extension(
                Extension::new("ext").with_action("get_avatar", ResponseFactory::of::<Avatar>()),
            )
            .unwrap();
        let payload = registry
            .factory("get_avatar")
            .decode(json!({"url": "http://a"}))
            .unwrap();
        assert_eq!(payload.downcast_ref::<Avatar>().unwrap().url, "http://a");
        assert!(registry.has_extension("ext"));
        assert_eq!(registry.owner("get_avatar").as_deref(), Some("ext"));
    }

    #[test]
    fn test_registration_conflicts_roll_back() {
        let registry = ActionRegistry::new();
        registry
            .register_extension(Extension::new("a").with_action("x", ResponseFactory::of::<Value>()))
            .unwrap();

        let err = registry
            .register_extension(Extension::new("a").with_action("y", ResponseFactory::of::<Value>()))
            .unwrap_err();
        assert_eq!(err, RegistryError::ExtensionAlreadyRegistered("a".into()));

        let err = registry
            .register_extension(
                Extension::new("b")
                    .with_action("z", ResponseFactory::of::<Value>())
                    .with_action("x", ResponseFactory::of::<Value>()),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::ActionAlreadyRegistered { ref owner, .. } if owner == "a"));
        assert!(!registry.has_extension("b"));
        assert_eq!(registry.owner("z"), None);

        let err = registry
            .register_extension(
                Extension::new("c").with_action(action::GET_STATUS, ResponseFactory::of::<Value>()),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::ActionAlreadyRegistered { .. }));
    }
}
