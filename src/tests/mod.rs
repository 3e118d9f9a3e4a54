mod appeals_tests;
mod router_tests;
mod utils;
