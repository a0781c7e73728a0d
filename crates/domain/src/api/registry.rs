//! Built-in operation tables

use super::descriptor::{ApiDescriptor, ApiRegistry};

/// Operations against the token endpoint. Both paths are empty: the
/// descriptor is resolved against the token URL itself.
#[must_use]
pub fn token_registry() -> ApiRegistry {
    ApiRegistry::new()
        .with(
            "get_token",
            ApiDescriptor::post("")
                .with_param("grant_type", "authorization_code")
                .with_valid_status(&[200]),
        )
        .with(
            "refresh_token",
            ApiDescriptor::post("")
                .with_param("grant_type", "refresh_token")
                .with_valid_status(&[200]),
        )
}

/// Wrike v4 resource operations used by the resource-management layer.
#[must_use]
pub fn wrike_registry() -> ApiRegistry {
    ApiRegistry::new()
        .with("account", ApiDescriptor::get("/account"))
        .with("contacts", ApiDescriptor::get("/contacts"))
        .with("user", ApiDescriptor::get("/users/{user_id}"))
        .with("workflows", ApiDescriptor::get("/workflows"))
        .with("customfields", ApiDescriptor::get("/customfields"))
        .with("create_customfield", ApiDescriptor::post("/customfields"))
        .with("spaces", ApiDescriptor::get("/spaces"))
        .with("space", ApiDescriptor::get("/spaces/{space_id}"))
        .with("create_space", ApiDescriptor::post("/spaces"))
        .with("space_folders", ApiDescriptor::get("/spaces/{space_id}/folders"))
        .with("space_tasks", ApiDescriptor::get("/spaces/{space_id}/tasks"))
        .with("folders", ApiDescriptor::get("/folders"))
        .with("folder", ApiDescriptor::get("/folders/{folder_id}"))
        .with("folder_folders", ApiDescriptor::get("/folders/{folder_id}/folders"))
        .with("create_folder", ApiDescriptor::post("/folders/{folder_id}/folders"))
        .with("update_folder", ApiDescriptor::put("/folders/{folder_id}"))
        .with("delete_folder", ApiDescriptor::delete("/folders/{folder_id}"))
        .with("folder_tasks", ApiDescriptor::get("/folders/{folder_id}/tasks"))
        .with("create_task", ApiDescriptor::post("/folders/{folder_id}/tasks"))
        .with("tasks", ApiDescriptor::get("/tasks"))
        .with("task", ApiDescriptor::get("/tasks/{task_id}"))
        .with("update_task", ApiDescriptor::put("/tasks/{task_id}"))
        .with("delete_task", ApiDescriptor::delete("/tasks/{task_id}"))
}
