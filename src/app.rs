use crate::{
    middleware::{catch_panic, cors},
    routes,
    service::attendance::AttendanceService,
    utils::static_files::StaticRoot,
};
use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{Logger, NormalizePath, from_fn},
    web::Data,
};

/// The full application: middleware stack, shared state and routes.
pub fn build(
    service: Data<AttendanceService>,
    static_root: Data<StaticRoot>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(from_fn(catch_panic))
        .wrap(cors())
        .wrap(Logger::default())
        .wrap(NormalizePath::trim())
        .app_data(service)
        .app_data(static_root)
        .configure(routes::configure)
}
