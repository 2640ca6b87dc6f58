//! Permission matrix: categories, flags and the read-before-write rule.
//!
//! Every category has exactly one `read*` flag. Any other flag of the category
//! may only be granted while that read flag is granted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource category guarded by the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    User,
    Product,
    Service,
    Blog,
    Query,
    Log,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::User,
        Category::Product,
        Category::Service,
        Category::Blog,
        Category::Query,
        Category::Log,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::User => "user",
            Category::Product => "product",
            Category::Service => "service",
            Category::Blog => "blog",
            Category::Query => "query",
            Category::Log => "log",
        }
    }

    /// The flag every other flag of this category depends on.
    pub fn read_flag(self) -> Flag {
        match self {
            Category::User => Flag::ReadUser,
            Category::Product => Flag::ReadProduct,
            Category::Service => Flag::ReadService,
            Category::Blog => Flag::ReadBlog,
            Category::Query => Flag::ReadQuery,
            Category::Log => Flag::ReadLog,
        }
    }

    /// All flags of the category, read flag first.
    pub fn flags(self) -> &'static [Flag] {
        match self {
            Category::User => &[
                Flag::ReadUser,
                Flag::CreateUser,
                Flag::DeleteUser,
                Flag::UpdatePassword,
                Flag::RetrievePassword,
                Flag::UpdatePermissions,
            ],
            Category::Product => &[
                Flag::ReadProduct,
                Flag::AddProduct,
                Flag::UpdateProduct,
                Flag::DeleteProduct,
            ],
            Category::Service => &[
                Flag::ReadService,
                Flag::AddService,
                Flag::UpdateService,
                Flag::DeleteService,
            ],
            Category::Blog => &[
                Flag::ReadBlog,
                Flag::AddBlog,
                Flag::UpdateBlog,
                Flag::DeleteBlog,
            ],
            Category::Query => &[Flag::ReadQuery, Flag::UpdateStatus, Flag::DeleteQuery],
            Category::Log => &[Flag::ReadLog, Flag::DeleteLog],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    ReadUser,
    CreateUser,
    DeleteUser,
    UpdatePassword,
    RetrievePassword,
    UpdatePermissions,
    ReadProduct,
    AddProduct,
    UpdateProduct,
    DeleteProduct,
    ReadService,
    AddService,
    UpdateService,
    DeleteService,
    ReadBlog,
    AddBlog,
    UpdateBlog,
    DeleteBlog,
    ReadQuery,
    UpdateStatus,
    DeleteQuery,
    ReadLog,
    DeleteLog,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::ReadUser => "readUser",
            Flag::CreateUser => "createUser",
            Flag::DeleteUser => "deleteUser",
            Flag::UpdatePassword => "updatePassword",
            Flag::RetrievePassword => "retrievePassword",
            Flag::UpdatePermissions => "updatePermissions",
            Flag::ReadProduct => "readProduct",
            Flag::AddProduct => "addProduct",
            Flag::UpdateProduct => "updateProduct",
            Flag::DeleteProduct => "deleteProduct",
            Flag::ReadService => "readService",
            Flag::AddService => "addService",
            Flag::UpdateService => "updateService",
            Flag::DeleteService => "deleteService",
            Flag::ReadBlog => "readBlog",
            Flag::AddBlog => "addBlog",
            Flag::UpdateBlog => "updateBlog",
            Flag::DeleteBlog => "deleteBlog",
            Flag::ReadQuery => "readQuery",
            Flag::UpdateStatus => "updateStatus",
            Flag::DeleteQuery => "deleteQuery",
            Flag::ReadLog => "readLog",
            Flag::DeleteLog => "deleteLog",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Flag::ReadUser
            | Flag::CreateUser
            | Flag::DeleteUser
            | Flag::UpdatePassword
            | Flag::RetrievePassword
            | Flag::UpdatePermissions => Category::User,
            Flag::ReadProduct | Flag::AddProduct | Flag::UpdateProduct | Flag::DeleteProduct => {
                Category::Product
            }
            Flag::ReadService | Flag::AddService | Flag::UpdateService | Flag::DeleteService => {
                Category::Service
            }
            Flag::ReadBlog | Flag::AddBlog | Flag::UpdateBlog | Flag::DeleteBlog => Category::Blog,
            Flag::ReadQuery | Flag::UpdateStatus | Flag::DeleteQuery => Category::Query,
            Flag::ReadLog | Flag::DeleteLog => Category::Log,
        }
    }

    pub fn is_read(self) -> bool {
        self.category().read_flag() == self
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected permission change or malformed matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// A dependent flag was granted while its category's read flag is off.
    ReadRequired { flag: Flag, read_flag: Flag },
    /// A flag was listed under a category it does not belong to.
    Misplaced { category: Category, flag: Flag },
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::ReadRequired { flag, read_flag } => {
                write!(f, "{} requires {} to be enabled first", flag, read_flag)
            }
            PermissionError::Misplaced { category, flag } => {
                write!(f, "{} is not a {} permission", flag, category)
            }
        }
    }
}

impl std::error::Error for PermissionError {}

/// Wire shape: category -> flag -> bool, every flag spelled out.
type RawMatrix = BTreeMap<Category, BTreeMap<Flag, bool>>;

/// The set of granted flags for one user.
///
/// Serialises as a nested object (`{"user": {"readUser": true, ...}, ...}`)
/// with every category and flag present, so a matrix written and read back is
/// structurally identical. Missing entries deserialise as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix", into = "RawMatrix")]
pub struct PermissionMatrix {
    granted: BTreeSet<Flag>,
}

impl PermissionMatrix {
    /// A matrix with nothing granted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A matrix with every flag granted (the root admin).
    pub fn full() -> Self {
        Self {
            granted: Category::ALL
                .iter()
                .flat_map(|c| c.flags().iter().copied())
                .collect(),
        }
    }

    /// Build a valid matrix from a list of flags, applying them in order.
    pub fn from_flags(flags: &[Flag]) -> Result<Self, PermissionError> {
        let mut matrix = Self::empty();
        for flag in flags {
            matrix.set(*flag, true)?;
        }
        Ok(matrix)
    }

    pub fn allows(&self, flag: Flag) -> bool {
        self.granted.contains(&flag)
    }

    pub fn granted(&self) -> impl Iterator<Item = Flag> + '_ {
        self.granted.iter().copied()
    }

    /// Apply one checkbox change.
    ///
    /// Turning a read flag off clears the whole category. Turning a dependent
    /// flag on while the read flag is off is rejected and leaves the matrix
    /// untouched.
    pub fn set(&mut self, flag: Flag, enabled: bool) -> Result<(), PermissionError> {
        let category = flag.category();

        if flag.is_read() && !enabled {
            for sibling in category.flags() {
                self.granted.remove(sibling);
            }
            return Ok(());
        }

        if enabled && !flag.is_read() && !self.allows(category.read_flag()) {
            return Err(PermissionError::ReadRequired {
                flag,
                read_flag: category.read_flag(),
            });
        }

        if enabled {
            self.granted.insert(flag);
        } else {
            self.granted.remove(&flag);
        }
        Ok(())
    }

    /// Check the read-before-write rule for a matrix received from outside.
    pub fn validate(&self) -> Result<(), PermissionError> {
        for flag in &self.granted {
            let read_flag = flag.category().read_flag();
            if !flag.is_read() && !self.allows(read_flag) {
                return Err(PermissionError::ReadRequired {
                    flag: *flag,
                    read_flag,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<RawMatrix> for PermissionMatrix {
    type Error = PermissionError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        let mut granted = BTreeSet::new();
        for (category, flags) in raw {
            for (flag, enabled) in flags {
                if flag.category() != category {
                    return Err(PermissionError::Misplaced { category, flag });
                }
                if enabled {
                    granted.insert(flag);
                }
            }
        }
        Ok(Self { granted })
    }
}

impl From<PermissionMatrix> for RawMatrix {
    fn from(matrix: PermissionMatrix) -> Self {
        Category::ALL
            .iter()
            .map(|category| {
                let flags = category
                    .flags()
                    .iter()
                    .map(|flag| (*flag, matrix.allows(*flag)))
                    .collect();
                (*category, flags)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all_flags() -> impl Iterator<Item = Flag> {
        Category::ALL.iter().flat_map(|c| c.flags().iter().copied())
    }

    #[test]
    fn test_every_category_lists_its_read_flag_first() {
        for category in Category::ALL {
            assert_eq!(category.flags()[0], category.read_flag());
            for flag in category.flags() {
                assert_eq!(flag.category(), category);
            }
        }
    }

    #[test]
    fn test_disabling_read_clears_category() {
        for category in Category::ALL {
            let mut matrix = PermissionMatrix::full();
            matrix.set(category.read_flag(), false).unwrap();

            for flag in category.flags() {
                assert!(!matrix.allows(*flag), "{} still granted", flag);
            }
            // Other categories are untouched.
            for other in Category::ALL.iter().filter(|c| **c != category) {
                assert!(matrix.allows(other.read_flag()));
            }
            assert!(matrix.validate().is_ok());
        }
    }

    #[test]
    fn test_dependent_flag_rejected_without_read() {
        for flag in all_flags().filter(|f| !f.is_read()) {
            let mut matrix = PermissionMatrix::empty();
            let before = matrix.clone();

            let err = matrix.set(flag, true).unwrap_err();

            assert_eq!(
                err,
                PermissionError::ReadRequired {
                    flag,
                    read_flag: flag.category().read_flag()
                }
            );
            assert_eq!(matrix, before);
        }
    }

    #[test]
    fn test_dependent_flag_allowed_with_read() {
        let mut matrix = PermissionMatrix::empty();
        matrix.set(Flag::ReadQuery, true).unwrap();
        matrix.set(Flag::UpdateStatus, true).unwrap();
        assert!(matrix.allows(Flag::UpdateStatus));

        matrix.set(Flag::UpdateStatus, false).unwrap();
        assert!(!matrix.allows(Flag::UpdateStatus));
        assert!(matrix.allows(Flag::ReadQuery));
    }

    #[test]
    fn test_validate_rejects_orphaned_flag() {
        let matrix: PermissionMatrix =
            serde_json::from_value(json!({ "blog": { "readBlog": false, "deleteBlog": true } }))
                .unwrap();

        assert_eq!(
            matrix.validate(),
            Err(PermissionError::ReadRequired {
                flag: Flag::DeleteBlog,
                read_flag: Flag::ReadBlog
            })
        );
    }

    #[test]
    fn test_serialises_every_flag() {
        let matrix = PermissionMatrix::from_flags(&[Flag::ReadUser]).unwrap();
        let value = serde_json::to_value(&matrix).unwrap();

        assert_eq!(value["user"]["readUser"], true);
        assert_eq!(value["user"]["createUser"], false);
        assert_eq!(value["log"]["deleteLog"], false);
        assert_eq!(value.as_object().unwrap().len(), Category::ALL.len());
    }

    #[test]
    fn test_deserialise_round_trip() {
        let matrix =
            PermissionMatrix::from_flags(&[Flag::ReadProduct, Flag::AddProduct, Flag::ReadLog])
                .unwrap();
        let text = serde_json::to_string(&matrix).unwrap();
        let back: PermissionMatrix = serde_json::from_str(&text).unwrap();
        assert_eq!(back, matrix);
    }

    #[test]
    fn test_misplaced_and_unknown_flags_rejected() {
        let misplaced =
            serde_json::from_value::<PermissionMatrix>(json!({ "product": { "readUser": true } }));
        assert!(misplaced.is_err());

        let unknown =
            serde_json::from_value::<PermissionMatrix>(json!({ "user": { "launchDrone": true } }));
        assert!(unknown.is_err());

        let unknown_category =
            serde_json::from_value::<PermissionMatrix>(json!({ "fleet": {} }));
        assert!(unknown_category.is_err());
    }
}
