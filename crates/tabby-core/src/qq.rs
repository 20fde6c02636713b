//! Plain QQ domain records shared by events and API responses.
//!
//! Records nest the way the gateway nests them: a [`GroupUser`] carries a
//! [`User`], which carries a [`BasicUser`], all flattened on the wire.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw numeric id.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// A QQ account number.
    UserId
);
id_newtype!(
    /// A group number.
    GroupId
);
id_newtype!(
    /// A message id as assigned by the gateway.
    MessageId
);

/// Account sex as reported by the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Role of a member inside a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Admin,
    #[default]
    #[serde(other)]
    Member,
}

impl GroupRole {
    /// Returns `true` for owners and admins.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicUser {
    pub user_id: UserId,
    pub nickname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicUserWithAvatar {
    #[serde(flatten)]
    pub user: BasicUser,
    pub avatar: String,
}

/// A user as seen in private messages and stranger lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(flatten)]
    pub user: BasicUser,
    pub sex: Sex,
    pub age: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicFriend {
    #[serde(flatten)]
    pub user: BasicUser,
    pub remark: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Friend {
    #[serde(flatten)]
    pub friend: BasicFriend,
    pub sex: Sex,
    pub age: i32,
}

/// A group member, as carried by group message senders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupUser {
    #[serde(flatten)]
    pub user: User,
    pub card: String,
    pub area: String,
    pub level: String,
    pub role: GroupRole,
    pub title: String,
}

impl GroupUser {
    /// The card if set, otherwise the nickname.
    pub fn display_name(&self) -> &str {
        if self.card.is_empty() {
            &self.user.user.nickname
        } else {
            &self.card
        }
    }
}

/// A group member with membership details, as returned by member lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailedGroupUser {
    #[serde(flatten)]
    pub member: GroupUser,
    pub group_id: GroupId,
    pub join_time: i64,
    pub last_sent_time: i64,
    pub unfriendly: bool,
    pub title_expire_time: i64,
    pub card_changeable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub group_id: GroupId,
    pub group_name: String,
    pub member_count: i32,
    pub max_member_count: i32,
}

/// Anonymous identity of a group message sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymousData {
    pub id: i64,
    pub name: String,
    /// Needed to mute the anonymous sender.
    pub flag: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_user_flattened_fields() {
        let member: GroupUser = serde_json::from_str(
            r#"{"user_id":10001,"nickname":"neko","sex":"female","age":3,"card":"","role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(member.user.user.user_id, UserId(10001));
        assert_eq!(member.user.sex, Sex::Female);
        assert!(member.role.is_admin());
        assert_eq!(member.display_name(), "neko");
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let user: User = serde_json::from_str(r#"{"user_id":1,"sex":"robot"}"#).unwrap();
        assert_eq!(user.sex, Sex::Unknown);
        let member: GroupUser = serde_json::from_str(r#"{"role":"guest"}"#).unwrap();
        assert_eq!(member.role, GroupRole::Member);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(GroupId(42).to_string(), "42");
        assert_eq!(i64::from(UserId::from(7)), 7);
        assert_eq!(" 12 ".parse::<MessageId>().unwrap(), MessageId(12));
    }
}
