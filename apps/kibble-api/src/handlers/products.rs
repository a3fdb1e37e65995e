//! Product search and detail handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use kibble_core::classify::classify_ingredient;
use kibble_core::domain::{DEFAULT_LIMIT, Product, ProductForm, SearchRequest, SortKey};
use kibble_shared::dto::{
    IngredientDto, NutritionDto, ProductDetailResponse, ProductSummaryDto, SearchProductsQuery,
    SearchProductsResponse,
};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::Admission;
use crate::state::AppState;

const MAX_PRODUCT_ID_LEN: usize = 128;

/// GET /api/products/search
///
/// The query string is decoded here rather than by an extractor so that a
/// malformed one still gets a metered problem response.
pub async fn search(
    admission: Admission,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let query = web::Query::<SearchProductsQuery>::from_query(req.query_string())
        .map_err(|e| admission.fail(AppError::BadRequest(format!("Invalid query string: {e}"))))?;
    let request = parse_search(&state, query.into_inner()).map_err(|e| admission.fail(e))?;

    tracing::debug!(
        identity = %admission.identity,
        client_side = request.needs_client_side_processing(),
        limit = request.limit,
        cursor = request.cursor,
        "Searching products"
    );

    let result = state
        .pipeline
        .execute(&request)
        .await
        .map_err(|e| admission.fail(e))?;

    let items = result
        .items
        .into_iter()
        .map(|summary| ProductSummaryDto {
            detail_url: state.detail_url(&summary.id),
            id: summary.id,
            name: summary.name,
            brand: summary.brand,
            form: summary.form.map(|f| f.to_string()),
            ingredients_preview: summary.ingredients_preview,
        })
        .collect();

    Ok(admission.ok_json(&SearchProductsResponse {
        items,
        total: result.total,
        has_more: result.has_more,
        cursor: result.cursor,
        rate_limit: admission.rate_limit,
        filter_note: result.filter_note,
        suggestions: result.suggestions,
    }))
}

/// GET /api/products/{id}
pub async fn detail(
    admission: Admission,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !is_valid_product_id(&id) {
        return Err(admission.fail(AppError::BadRequest("Invalid product id".to_string())));
    }

    let product = match state.products.get(&id).await {
        Some(product) => product,
        None => {
            let product = state
                .catalog
                .fetch_product(&id)
                .await
                .map_err(|e| admission.fail(e))?;
            if let Err(e) = state.products.put(&product).await {
                tracing::warn!(product_id = %id, error = %e, "Failed to cache product");
            }
            product
        }
    };

    Ok(admission.ok_json(&detail_response(product, &admission)))
}

fn detail_response(product: Product, admission: &Admission) -> ProductDetailResponse {
    let names: &[String] = if product.ingredients_full.is_empty() {
        product.preview()
    } else {
        &product.ingredients_full
    };

    let ingredients = names
        .iter()
        .map(|name| IngredientDto {
            name: name.clone(),
            category: classify_ingredient(name).as_str().to_string(),
        })
        .collect();

    let nutrition = product.nutrition.clone().unwrap_or_default();
    let metrics = product.derived_metrics.clone().unwrap_or_default();

    ProductDetailResponse {
        form: product.form.map(|f| f.to_string()),
        condition_tags: product.condition_tags,
        ingredients,
        nutrition: NutritionDto {
            protein: nutrition.protein,
            fat: nutrition.fat,
            fiber: nutrition.fiber,
            moisture: nutrition.moisture,
            carb_estimated: metrics.carb_estimated,
            meat_score: metrics.meat_score,
        },
        id: product.id,
        name: product.name,
        brand: product.brand,
        rate_limit: admission.rate_limit,
    }
}

fn parse_search(state: &AppState, query: SearchProductsQuery) -> Result<SearchRequest, AppError> {
    let form = non_blank(query.form)
        .map(|f| f.parse::<ProductForm>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let conditions = non_blank(query.conditions)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let request = SearchRequest {
        query: non_blank(query.query),
        form,
        conditions,
        include_terms: state.pipeline.parse_terms(query.include_ingredients.as_deref()),
        exclude_terms: state.pipeline.parse_terms(query.exclude_ingredients.as_deref()),
        min_protein: parse_nutrient("minProtein", query.min_protein)?,
        max_carbs: parse_nutrient("maxCarbs", query.max_carbs)?,
        sort_by: non_blank(query.sort_by).map(|s| SortKey::parse(&s)),
        limit: parse_count("limit", query.limit)?.unwrap_or(DEFAULT_LIMIT),
        cursor: parse_count("cursor", query.cursor)?.unwrap_or(0),
    };

    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(request)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_nutrient(name: &str, value: Option<String>) -> Result<Option<f64>, AppError> {
    non_blank(value)
        .map(|v| {
            v.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n >= 0.0)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("{name} must be a non-negative number"))
                })
        })
        .transpose()
}

fn parse_count(name: &str, value: Option<String>) -> Result<Option<usize>, AppError> {
    non_blank(value)
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                AppError::BadRequest(format!("{name} must be a non-negative integer"))
            })
        })
        .transpose()
}

fn is_valid_product_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_PRODUCT_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
