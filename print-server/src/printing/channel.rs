//! Broadcast channel naming

use shared::models::PrinterRef;

/// 所有打印频道的前缀，后接门店 uuid
pub const CHANNEL_PREFIX: &str = "print-orders-";

/// 打印机所属门店的广播频道
pub fn channel_for(printer: &PrinterRef) -> String {
    channel_for_store(&printer.store.uuid)
}

pub fn channel_for_store(store_uuid: &str) -> String {
    format!("{CHANNEL_PREFIX}{store_uuid}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Store;

    fn printer(id: i64, store_uuid: &str) -> PrinterRef {
        PrinterRef::new(
            id,
            "Kitchen-1",
            Store {
                id: 1,
                uuid: store_uuid.into(),
                name: String::new(),
            },
        )
    }

    #[test]
    fn test_channel_depends_only_on_store_uuid() {
        assert_eq!(channel_for(&printer(3, "abc-uuid")), "print-orders-abc-uuid");
        assert_eq!(
            channel_for(&printer(3, "abc-uuid")),
            channel_for(&printer(99, "abc-uuid"))
        );
        assert_ne!(
            channel_for(&printer(3, "abc-uuid")),
            channel_for(&printer(3, "def-uuid"))
        );
    }
}
