use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::config::ServerConfig;
use crate::pipeline::Grader;
use crate::routes::{
    exam_run_handler, exam_upload_compile_handler, query_error_handler, test_build_handler,
    test_upload_handler,
};

pub fn build_server(server_config: ServerConfig, grader: Grader) -> std::io::Result<Server> {
    let grader = web::Data::new(grader);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(grader.clone())
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .wrap(middleware::Logger::default())
            .service(exam_run_handler)
            .service(exam_upload_compile_handler)
            .service(test_upload_handler)
            .service(test_build_handler)
    })
    .bind((
        server_config
            .bind_address
            .unwrap_or("127.0.0.1".to_string()),
        server_config.bind_port.unwrap_or(12345),
    ))?
    .run();

    Ok(server)
}
