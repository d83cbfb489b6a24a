use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hotel Back-Office API",
        version = "1.0.0",
        description = r#"
# Hotel Back-Office API

Front desk and shop floor of a small hotel: rooms and guest stays, a product
inventory grouped in categories, sales against that inventory, and
spreadsheet-style exports.

## Error Handling

Errors share one body format:

```json
{
  "error": "Unprocessable Entity",
  "message": "Insufficient stock for Soap: only 7 available, 8 requested",
  "request_id": "4c1e...",
  "timestamp": "2024-06-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20, capped
by the server's configured maximum).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "rooms", description = "Room records and availability"),
        (name = "guests", description = "Check-in, check-out and guest records"),
        (name = "inventory", description = "Categories, products and stock"),
        (name = "sales", description = "Point-of-sale records"),
        (name = "reports", description = "Guests, inventory and sales exports")
    ),
    paths(
        // Rooms
        crate::handlers::rooms::list_rooms,
        crate::handlers::rooms::list_available_rooms,
        crate::handlers::rooms::create_room,
        crate::handlers::rooms::get_room,
        crate::handlers::rooms::update_room,
        crate::handlers::rooms::delete_room,

        // Guests
        crate::handlers::guests::list_guests,
        crate::handlers::guests::check_in,
        crate::handlers::guests::get_guest,
        crate::handlers::guests::update_guest,
        crate::handlers::guests::delete_guest,
        crate::handlers::guests::check_out,
        crate::handlers::guests::check_out_many,

        // Inventory
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::rename_category,
        crate::handlers::categories::delete_category,
        crate::handlers::products::list_products,
        crate::handlers::products::list_in_stock,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::restock_product,

        // Sales
        crate::handlers::sales::list_sales,
        crate::handlers::sales::record_sale,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::update_sale,

        // Reports
        crate::handlers::reports::guests_report,
        crate::handlers::reports::inventory_report,
        crate::handlers::reports::sales_report,
        crate::handlers::reports::workbook_report,
    ),
    components(
        schemas(
            // Records
            crate::entities::room::Model,
            crate::entities::guest::Model,
            crate::entities::category::Model,
            crate::entities::product::Model,
            crate::entities::sale::Model,

            // Requests
            crate::services::rooms::CreateRoomInput,
            crate::services::rooms::UpdateRoomInput,
            crate::services::guests::CheckInInput,
            crate::services::guests::UpdateGuestInput,
            crate::services::guests::BulkCheckOutResult,
            crate::handlers::guests::BulkCheckOutRequest,
            crate::services::categories::CategoryInput,
            crate::handlers::categories::CategoryDeleted,
            crate::services::products::CreateProductInput,
            crate::services::products::UpdateProductInput,
            crate::services::products::RestockInput,
            crate::services::sales::RecordSaleInput,
            crate::services::sales::UpdateSaleInput,

            // Reports
            crate::services::reports::GuestRow,
            crate::services::reports::InventoryRow,
            crate::services::reports::SaleRow,
            crate::services::reports::Workbook,
            crate::handlers::reports::SheetFormat,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Hotel Back-Office API"));
        for path in [
            "/api/v1/rooms/{id}",
            "/api/v1/guests/{id}/check-out",
            "/api/v1/guests/check-out",
            "/api/v1/products/{id}/restock",
            "/api/v1/sales",
            "/api/v1/reports/workbook",
        ] {
            assert!(json.contains(path), "missing {path}");
        }
    }
}
