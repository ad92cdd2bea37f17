mod schema_registry_calls;
