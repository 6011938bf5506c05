pub(crate) async fn hello_handler() -> &'static str {
    "Hello"
}
