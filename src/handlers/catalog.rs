use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use super::{ValidJson, duplicate_slug, non_empty, resolve_slug};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        Category, CategoryNode, CreateCategoryRequest, CreateProductRequest, Product, ProductFilter,
        UpdateCategoryRequest, UpdateProductRequest,
    },
    repository::{RepositoryState, api_limit},
    tree,
};

// --- Categories ---

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses((status = 200, description = "Flat category list", body = [Category]))
)]
pub async fn list_categories(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

/// get_category_tree
///
/// [Authenticated Route] The category hierarchy, nested and ordered by `sort_order`.
#[utoipa::path(
    get,
    path = "/api/categories/tree",
    tag = "categories",
    responses((status = 200, description = "Nested categories", body = [CategoryNode]))
)]
pub async fn get_category_tree(_user: AuthUser, State(state): State<AppState>) -> AppResult<Json<Vec<CategoryNode>>> {
    let categories = state.repo.list_categories().await?;
    Ok(Json(tree::category_tree(categories)))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "categories",
    responses((status = 200, description = "Category", body = Category), (status = 404, description = "Not found"))
)]
pub async fn get_category(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Category>> {
    let category = state.repo.get_category(id).await?.ok_or(AppError::NotFound("Category"))?;
    Ok(Json(category))
}

/// create_category
///
/// [Authenticated Route] Creates a category. `level` is derived from the parent and the
/// category is appended after its last sibling unless `sort_order` is given.
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Validation failed, unknown parent or duplicate slug")
    )
)]
pub async fn create_category(
    _user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let slug = resolve_slug(req.slug, &req.name)?;
    if state.repo.get_category_by_slug(&slug).await?.is_some() {
        return Err(duplicate_slug("category", &slug));
    }

    let level = match req.parent_id {
        Some(parent_id) => {
            let parent = state
                .repo
                .get_category(parent_id)
                .await?
                .ok_or_else(|| AppError::BadRequest("Parent category does not exist".to_string()))?;
            parent.level + 1
        }
        None => 0,
    };

    let sort_order = match req.sort_order {
        Some(order) => order,
        None => tree::next_sort_order(&state.repo.list_categories().await?, req.parent_id),
    };

    let now = Utc::now();
    let category = state
        .repo
        .create_category(Category {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            slug,
            description: non_empty(req.description),
            parent_id: req.parent_id,
            level,
            sort_order,
            status: req.status,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(category_id = %category.id, level, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Authenticated Route] Partial update. Moving a category re-derives `level` for it
/// and its whole subtree; a category can not become its own ancestor.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "categories",
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 400, description = "Validation failed, invalid parent or duplicate slug"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_category(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    let mut category = state.repo.get_category(id).await?.ok_or(AppError::NotFound("Category"))?;

    if let Some(slug) = &req.slug {
        if state.repo.get_category_by_slug(slug).await?.is_some_and(|other| other.id != id) {
            return Err(duplicate_slug("category", slug));
        }
    }

    let mut all = state.repo.list_categories().await?;
    let moved = req.parent_id.is_some_and(|parent| parent != category.parent_id);

    if let Some(Some(parent_id)) = req.parent_id {
        if parent_id == id {
            return Err(AppError::BadRequest("A category can not be its own parent".to_string()));
        }
        if !all.iter().any(|c| c.id == parent_id) {
            return Err(AppError::BadRequest("Parent category does not exist".to_string()));
        }
        if tree::descendants(&all, id).contains(&parent_id) {
            return Err(AppError::BadRequest(
                "A category can not be moved below one of its own descendants".to_string(),
            ));
        }
    }

    if let Some(name) = req.name {
        category.name = name.trim().to_string();
    }
    if let Some(slug) = req.slug {
        category.slug = slug;
    }
    if let Some(description) = req.description {
        category.description = non_empty(description);
    }
    if let Some(parent_id) = req.parent_id {
        category.parent_id = parent_id;
    }
    if let Some(sort_order) = req.sort_order {
        category.sort_order = sort_order;
    }
    if let Some(status) = req.status {
        category.status = status;
    }

    if moved {
        if let Some(row) = all.iter_mut().find(|c| c.id == id) {
            row.parent_id = category.parent_id;
        }
        let levels = tree::levels(&all);
        category.level = levels.get(&id).copied().unwrap_or_default();
        let mut changed: Vec<(Uuid, i32)> = tree::descendants(&all, id)
            .into_iter()
            .filter_map(|child| levels.get(&child).map(|level| (child, *level)))
            .collect();
        changed.sort();

        let category = state.repo.update_category(category).await?;
        state.repo.set_category_levels(&changed).await?;
        tracing::info!(category_id = %id, level = category.level, descendants = changed.len(), "category moved");
        return Ok(Json(category));
    }

    Ok(Json(state.repo.update_category(category).await?))
}

/// delete_category
///
/// [Authenticated Route] Refused with 400 while the category still has subcategories
/// or products.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "categories",
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Category is not empty"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_category(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.get_category(id).await?.is_none() {
        return Err(AppError::NotFound("Category"));
    }

    let children = state.repo.count_child_categories(id).await?;
    if children > 0 {
        return Err(AppError::BadRequest(format!(
            "Category has {children} subcategories; move or delete them first"
        )));
    }
    let products = state.repo.count_products_in_category(id).await?;
    if products > 0 {
        return Err(AppError::BadRequest(format!(
            "Category still contains {products} products; reassign them first"
        )));
    }

    state.repo.delete_category(id).await?;
    tracing::info!(category_id = %id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Products ---

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(ProductFilter),
    responses((status = 200, description = "Products", body = [Product]))
)]
pub async fn list_products(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(mut filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<Product>>> {
    filter.limit = api_limit(filter.limit);
    Ok(Json(state.repo.list_products(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    responses((status = 200, description = "Product", body = Product), (status = 404, description = "Not found"))
)]
pub async fn get_product(_user: AuthUser, State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Product>> {
    let product = state.repo.get_product(id).await?.ok_or(AppError::NotFound("Product"))?;
    Ok(Json(product))
}

/// create_product
///
/// [Authenticated Route] Creates a catalogue entry. `specifications` defaults to an
/// empty object and must be a JSON object when given.
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Validation failed, unknown category or duplicate slug")
    )
)]
pub async fn create_product(
    _user: AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let slug = resolve_slug(req.slug, &req.name)?;
    if state.repo.get_product_by_slug(&slug).await?.is_some() {
        return Err(duplicate_slug("product", &slug));
    }
    ensure_category(&state.repo, req.category_id).await?;

    let specifications = req.specifications.unwrap_or_else(|| serde_json::json!({}));
    ensure_object(&specifications)?;

    let now = Utc::now();
    let product = state
        .repo
        .create_product(Product {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            slug,
            category_id: req.category_id,
            summary: non_empty(req.summary),
            description: req.description,
            specifications,
            features: req.features,
            images: req.images,
            datasheet_url: non_empty(req.datasheet_url),
            status: req.status,
            is_featured: req.is_featured,
            sort_order: req.sort_order.unwrap_or_default(),
            meta_title: non_empty(req.meta_title),
            meta_description: non_empty(req.meta_description),
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 400, description = "Validation failed, unknown category or duplicate slug"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_product(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let mut product = state.repo.get_product(id).await?.ok_or(AppError::NotFound("Product"))?;

    if let Some(slug) = &req.slug {
        if state.repo.get_product_by_slug(slug).await?.is_some_and(|other| other.id != id) {
            return Err(duplicate_slug("product", slug));
        }
    }
    if let Some(category_id) = req.category_id {
        ensure_category(&state.repo, category_id).await?;
    }
    if let Some(specifications) = &req.specifications {
        ensure_object(specifications)?;
    }

    req.apply_to(&mut product);
    Ok(Json(state.repo.update_product(product).await?))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"))
)]
pub async fn delete_product(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.repo.delete_product(id).await? {
        tracing::info!(product_id = %id, "product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Product"))
    }
}

async fn ensure_category(repo: &RepositoryState, category_id: Option<Uuid>) -> AppResult<()> {
    let Some(category_id) = category_id else {
        return Ok(());
    };
    match repo.get_category(category_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest("Category does not exist".to_string())),
    }
}

fn ensure_object(value: &serde_json::Value) -> AppResult<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(AppError::BadRequest("specifications must be a JSON object".to_string()))
    }
}
