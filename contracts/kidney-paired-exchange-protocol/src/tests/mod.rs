mod registration;
mod rules;
