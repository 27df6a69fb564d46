use crate::api::{ApiResponse, ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest};
use crate::middleware::{check_role, CurrentUser, HttpError};
use crate::state::AppState;
use crate::validation::ValidatedJson;
use arbor::users::{NewUser, ProfileUpdate, Role, UserProfile};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

type JsonResult<T> = Result<Json<ApiResponse<T>>, HttpError>;

/// POST /api/v1/users/create - Register a new account
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), HttpError> {
    info!("CREATE_USER: email={}", req.email);

    let profile = state
        .user_service
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password: req.password,
            role: Role::User,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("User created successfully", profile)),
    ))
}

/// PATCH /api/v1/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> JsonResult<()> {
    state
        .user_service
        .change_password(&current_user.id, &req.old_password, &req.new_password)
        .await?;

    info!("CHANGE_PASSWORD: user={}", current_user.id);
    Ok(Json(ApiResponse::message_only("Password changed successfully")))
}

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
) -> JsonResult<UserProfile> {
    let profile = state.user_service.get_profile(&current_user.id).await?;
    Ok(Json(ApiResponse::new("Profile retrieved successfully", profile)))
}

/// PATCH /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> JsonResult<UserProfile> {
    let update = ProfileUpdate {
        name: req.name.map(|name| name.trim().to_string()),
        profile_image: req.profile_image,
    };

    let profile = state
        .user_service
        .update_profile(&current_user.id, update)
        .await?;
    Ok(Json(ApiResponse::new("Profile updated successfully", profile)))
}

/// DELETE /api/v1/users/delete-me
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
) -> JsonResult<UserProfile> {
    info!("DELETE_ME: user={}", current_user.id);

    let profile = state.user_service.delete_user(&current_user.id).await?;
    Ok(Json(ApiResponse::new("Account deleted successfully", profile)))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> JsonResult<UserProfile> {
    let profile = state.user_service.get_profile(&id).await?;
    Ok(Json(ApiResponse::new("User retrieved successfully", profile)))
}

/// DELETE /api/v1/users/{id} - Admin only
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(id): Path<String>,
) -> JsonResult<UserProfile> {
    check_role(&current_user, &[Role::Admin])?;

    info!("DELETE_USER: id={}, requested_by={}", id, current_user.id);

    let profile = state.user_service.delete_user(&id).await?;
    Ok(Json(ApiResponse::new("User deleted successfully", profile)))
}
