//! Permission Definitions
//!
//! 打印中继只关心少量权限：触发打印、查看中继状态。

/// 触发订单/菜品打印
pub const PERM_ORDERS_PRINT: &str = "orders:print";

/// 查看中继订阅者等系统设置
pub const PERM_SETTINGS_MANAGE: &str = "settings:manage";

/// 超级权限
pub const PERM_ALL: &str = "all";

/// 管理员角色名，拥有所有权限
pub const ROLE_ADMIN: &str = "admin";

/// 可配置权限列表 (不含 "all")
pub const ALL_PERMISSIONS: &[&str] = &[PERM_ORDERS_PRINT, PERM_SETTINGS_MANAGE];

/// Default permissions for a role name
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    let perms: &[&str] = match role_name {
        ROLE_ADMIN => &[PERM_ALL],
        "manager" => ALL_PERMISSIONS,
        "waiter" | "kitchen" => &[PERM_ORDERS_PRINT],
        _ => &[],
    };
    perms.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permissions() {
        assert_eq!(get_default_permissions("admin"), vec!["all"]);
        assert_eq!(get_default_permissions("waiter"), vec!["orders:print"]);
        assert!(get_default_permissions("guest").is_empty());
    }
}
