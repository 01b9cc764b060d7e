mod common;

mod checklist;
mod legacy;
mod routing;
