use utoipa::{IntoParams, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub nome: String, pub email: String, pub senha: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub senha: String }

#[derive(ToSchema)]
pub struct UpdateProfileRequest {
    pub nome: String,
    pub email: String,
    pub nova_senha: Option<String>,
    pub confirmar_senha: Option<String>,
}

/// Multipart form of `POST /extratos`.
#[derive(ToSchema)]
pub struct CreateExtratoForm {
    pub nome: String,
    /// Bank layout hint forwarded to the CSV parser.
    pub banco: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    #[allow(non_snake_case)]
    pub csvFile: Option<Vec<u8>>,
}

/// `id` 0 creates a row; the category is given by id or by name.
#[derive(ToSchema)]
pub struct MovimentacaoRequest {
    pub id: i32,
    pub descricao: String,
    /// `receita` or `despesa`
    pub tipo: String,
    /// Decimal with up to two places, e.g. `-12.50`
    pub valor: String,
    /// `YYYY-MM-DD`
    pub data_movimentacao: String,
    pub categoria_id: Option<i32>,
    pub categoria: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateExtratoRequest {
    pub nome: String,
    pub movimentacoes: Vec<MovimentacaoRequest>,
}

#[derive(ToSchema)]
pub struct GraficoRequest {
    pub titulo: String,
    pub tipo: String,
    pub campo1: String,
    pub campo2: String,
    pub cor: String,
    pub ativar_legenda: bool,
}

#[derive(ToSchema)]
pub struct CartaoRequest {
    pub nome: String,
    pub campo: String,
    /// `soma`, `media` or `contagem`
    pub tipo_agregacao: String,
    pub cor: String,
}

#[derive(ToSchema)]
pub struct DashboardRequest {
    pub descricao: String,
    pub extrato_id: i32,
    pub graficos: Vec<GraficoRequest>,
    pub cartoes: Vec<CartaoRequest>,
}

#[derive(ToSchema)]
pub struct DefaultDashboardRequest { pub descricao: String, pub extrato_id: i32 }

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based, default 1
    pub page: Option<u32>,
    /// 1..=100, default 20
    pub per_page: Option<u32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::usuarios::list,
        crate::routes::usuarios::get,
        crate::routes::usuarios::update,
        crate::routes::usuarios::delete,
        crate::routes::categorias::list,
        crate::routes::extratos::list,
        crate::routes::extratos::create,
        crate::routes::extratos::details,
        crate::routes::extratos::edit_view,
        crate::routes::extratos::update,
        crate::routes::extratos::delete,
        crate::routes::extratos::export_csv,
        crate::routes::extratos::add_batch,
        crate::routes::movimentacoes::list,
        crate::routes::movimentacoes::get,
        crate::routes::movimentacoes::update,
        crate::routes::movimentacoes::delete,
        crate::routes::dashboards::list,
        crate::routes::dashboards::available_extratos,
        crate::routes::dashboards::create,
        crate::routes::dashboards::create_default,
        crate::routes::dashboards::get,
        crate::routes::dashboards::update,
        crate::routes::dashboards::delete,
        crate::routes::dashboards::data,
        crate::routes::dashboards::add_grafico,
        crate::routes::dashboards::get_grafico,
        crate::routes::dashboards::update_grafico,
        crate::routes::dashboards::delete_grafico,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            CreateExtratoForm,
            MovimentacaoRequest,
            UpdateExtratoRequest,
            GraficoRequest,
            CartaoRequest,
            DashboardRequest,
            DefaultDashboardRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "usuarios"),
        (name = "categorias"),
        (name = "extratos"),
        (name = "movimentacoes"),
        (name = "dashboards"),
        (name = "graficos")
    )
)]
pub struct ApiDoc;
