use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::ValidJson;
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        CreateNavigationRequest, NavigationItem, NavigationNode, NavigationQuery, ReorderNavigationRequest,
        UpdateNavigationRequest,
    },
    tree,
};

/// get_navigation_tree
///
/// [Public Route] Active menu entries for one location (default `header`), nested.
/// Inactive items hide their whole subtree.
#[utoipa::path(
    get,
    path = "/api/navigation/tree",
    tag = "navigation",
    params(NavigationQuery),
    responses((status = 200, description = "Nested menu", body = [NavigationNode]))
)]
pub async fn get_navigation_tree(
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> AppResult<Json<Vec<NavigationNode>>> {
    let location = query.location.unwrap_or_default();
    let items = state.repo.list_navigation(Some(location)).await?;
    Ok(Json(active_tree(items)))
}

/// Builds the visitor-facing tree: inactive items and everything below them are left out.
pub(crate) fn active_tree(items: Vec<NavigationItem>) -> Vec<NavigationNode> {
    let hidden: std::collections::HashSet<Uuid> = items
        .iter()
        .filter(|item| !item.is_active)
        .flat_map(|item| {
            let mut ids = tree::descendants(&items, item.id);
            ids.insert(item.id);
            ids
        })
        .collect();
    tree::navigation_tree(items.into_iter().filter(|item| !hidden.contains(&item.id)).collect())
}

#[utoipa::path(
    get,
    path = "/api/navigation",
    tag = "navigation",
    params(NavigationQuery),
    responses((status = 200, description = "Flat navigation items, including inactive ones", body = [NavigationItem]))
)]
pub async fn list_navigation(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> AppResult<Json<Vec<NavigationItem>>> {
    Ok(Json(state.repo.list_navigation(query.location).await?))
}

#[utoipa::path(
    post,
    path = "/api/navigation",
    tag = "navigation",
    request_body = CreateNavigationRequest,
    responses(
        (status = 201, description = "Created", body = NavigationItem),
        (status = 400, description = "Validation failed or unknown parent")
    )
)]
pub async fn create_navigation_item(
    _user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateNavigationRequest>,
) -> AppResult<(StatusCode, Json<NavigationItem>)> {
    let siblings = state.repo.list_navigation(Some(req.location)).await?;
    if let Some(parent_id) = req.parent_id {
        let parent = state
            .repo
            .get_navigation_item(parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Parent navigation item does not exist".to_string()))?;
        if parent.location != req.location {
            return Err(AppError::BadRequest("Parent navigation item belongs to another menu".to_string()));
        }
    }

    let now = Utc::now();
    let item = state
        .repo
        .create_navigation_item(NavigationItem {
            id: Uuid::new_v4(),
            label: req.label.trim().to_string(),
            url: req.url.trim().to_string(),
            parent_id: req.parent_id,
            location: req.location,
            sort_order: req.sort_order.unwrap_or_else(|| tree::next_sort_order(&siblings, req.parent_id)),
            open_in_new_tab: req.open_in_new_tab,
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(item_id = %item.id, location = item.location.as_str(), "navigation item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// update_navigation_item
///
/// [Authenticated Route] Partial update. A new parent must exist, must sit in the
/// same menu and must not be the item itself or one of its descendants. An item
/// with children can not move to another menu.
#[utoipa::path(
    put,
    path = "/api/navigation/{id}",
    tag = "navigation",
    request_body = UpdateNavigationRequest,
    responses(
        (status = 200, description = "Updated", body = NavigationItem),
        (status = 400, description = "Validation failed or invalid parent"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_navigation_item(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateNavigationRequest>,
) -> AppResult<Json<NavigationItem>> {
    let mut item = state
        .repo
        .get_navigation_item(id)
        .await?
        .ok_or(AppError::NotFound("Navigation item"))?;

    let all = state.repo.list_navigation(None).await?;
    let location = req.location.unwrap_or(item.location);
    let parent_id = req.parent_id.unwrap_or(item.parent_id);

    if location != item.location && all.iter().any(|other| other.parent_id == Some(id)) {
        return Err(AppError::BadRequest(
            "A navigation item with children can not move to another menu".to_string(),
        ));
    }
    if let Some(parent_id) = parent_id {
        if parent_id == id {
            return Err(AppError::BadRequest("A navigation item can not be its own parent".to_string()));
        }
        let parent = all
            .iter()
            .find(|other| other.id == parent_id)
            .ok_or_else(|| AppError::BadRequest("Parent navigation item does not exist".to_string()))?;
        if parent.location != location {
            return Err(AppError::BadRequest("Parent navigation item belongs to another menu".to_string()));
        }
        if tree::descendants(&all, id).contains(&parent_id) {
            return Err(AppError::BadRequest(
                "A navigation item can not be moved below one of its own descendants".to_string(),
            ));
        }
    }

    req.apply_to(&mut item);
    Ok(Json(state.repo.update_navigation_item(item).await?))
}

/// delete_navigation_item
///
/// [Authenticated Route] Refused with 400 while the item still has children.
#[utoipa::path(
    delete,
    path = "/api/navigation/{id}",
    tag = "navigation",
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Item has children"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_navigation_item(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.get_navigation_item(id).await?.is_none() {
        return Err(AppError::NotFound("Navigation item"));
    }
    let children = state.repo.count_navigation_children(id).await?;
    if children > 0 {
        return Err(AppError::BadRequest(format!(
            "Navigation item has {children} children; move or delete them first"
        )));
    }

    state.repo.delete_navigation_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// reorder_navigation
///
/// [Authenticated Route] Applies a batch of `{id, parent_id, sort_order}` moves
/// atomically: if any entry is invalid nothing changes.
#[utoipa::path(
    put,
    path = "/api/navigation/reorder",
    tag = "navigation",
    request_body = ReorderNavigationRequest,
    responses(
        (status = 204, description = "Reordered"),
        (status = 400, description = "Unknown item, self-parenting, parent in another menu or cycle; nothing was changed")
    )
)]
pub async fn reorder_navigation(
    _user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ReorderNavigationRequest>,
) -> AppResult<StatusCode> {
    state.repo.reorder_navigation(&req.items).await?;
    tracing::info!(count = req.items.len(), "navigation reordered");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u128, parent: Option<u128>, active: bool) -> NavigationItem {
        NavigationItem {
            id: Uuid::from_u128(id),
            label: format!("item-{id}"),
            url: format!("/{id}"),
            parent_id: parent.map(Uuid::from_u128),
            is_active: active,
            ..Default::default()
        }
    }

    #[test]
    fn inactive_items_hide_their_subtree() {
        let items = vec![item(1, None, true), item(2, None, false), item(3, Some(2), true), item(4, Some(1), true)];
        let tree = active_tree(items);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, Uuid::from_u128(1));
        assert_eq!(tree[0].children.len(), 1);
    }
}
