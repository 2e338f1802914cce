use crate::{
    api::{
        attendance,
        error::{json_error, not_found},
    },
    docs::ApiDoc,
    utils::static_files,
};
use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets match
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .service(
            web::scope("/api").service(
                web::scope("/attendance")
                    // /api/attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::mark_attendance))
                            .default_service(web::route().to(not_found)),
                    )
                    // /api/attendance/{event_id}
                    .service(
                        web::resource("/{event_id}")
                            .route(web::get().to(attendance::list_event_attendance))
                            .default_service(web::route().to(not_found)),
                    ),
            ),
        )
        // static front-end for everything else
        .service(
            web::resource("/{tail:.*}")
                .route(web::get().to(static_files::serve))
                .default_service(web::route().to(not_found)),
        )
        .default_service(web::route().to(not_found));
}
