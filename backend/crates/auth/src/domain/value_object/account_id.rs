use kernel::id::Id;

/// Marker for account IDs; derives mirror `Id<T>`'s own so the alias
/// stays `Copy`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountMarker;
pub type AccountId = Id<AccountMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_new() {
        let account_id = AccountId::new();
        let uuid = account_id.as_uuid();
        assert_eq!(uuid.get_version_num(), 4); // UUIDv4
    }

    #[test]
    fn test_account_id_is_copy() {
        let account_id = AccountId::new();
        let copy = account_id;
        assert_eq!(copy, account_id);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let account_id = AccountId::from_uuid(uuid);
        assert_eq!(account_id.as_uuid(), &uuid);
    }
}
