//! Print the OpenAPI document to stdout for CI artifacts and client generation.

use trivia_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json().unwrap());
}
