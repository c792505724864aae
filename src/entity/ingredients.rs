use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::amount_ingredients::Entity")]
    AmountIngredients,
}

impl Related<super::amount_ingredients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AmountIngredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
